use crate::adapter::database_config::ConfigError;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// 永続化の方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// MySQL（本番）
    MySql,
    /// プロセス内メモリ（開発・検証用）
    Memory,
}

impl StorageBackend {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(StorageBackend::MySql),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(ConfigError::InvalidValue(format!(
                "Invalid STORAGE_BACKEND: {} (expected mysql or memory)",
                other
            ))),
        }
    }
}

/// アプリケーション設定
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_addr: SocketAddr,
    pub storage_backend: StorageBackend,
    /// 在庫行ロックの待機上限
    pub lock_timeout: Duration,
    /// メモリ方式で起動時にサンプルデータを投入するか
    pub seed_sample_data: bool,
    /// 空室照会・在庫登録で一度に指定できる最大日数
    pub inventory_max_range_days: usize,
}

impl AppConfig {
    /// 環境変数から設定を読み取る
    /// 環境変数が設定されていない場合はデフォルト値を使用
    pub fn from_env() -> Result<Self, ConfigError> {
        let server_addr = env::var("SERVER_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue(format!("Invalid SERVER_ADDR: {}", e)))?;

        let storage_backend =
            StorageBackend::parse(&env::var("STORAGE_BACKEND").unwrap_or_else(|_| "mysql".to_string()))?;

        let lock_timeout_ms = env::var("RESERVATION_LOCK_TIMEOUT_MS")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidValue(format!("Invalid RESERVATION_LOCK_TIMEOUT_MS: {}", e))
            })?;
        if lock_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "RESERVATION_LOCK_TIMEOUT_MS must be greater than 0".to_string(),
            ));
        }

        let seed_sample_data = env::var("SEED_SAMPLE_DATA")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .map_err(|e| ConfigError::InvalidValue(format!("Invalid SEED_SAMPLE_DATA: {}", e)))?;

        let inventory_max_range_days = env::var("INVENTORY_MAX_RANGE_DAYS")
            .unwrap_or_else(|_| "366".to_string())
            .parse::<usize>()
            .map_err(|e| {
                ConfigError::InvalidValue(format!("Invalid INVENTORY_MAX_RANGE_DAYS: {}", e))
            })?;
        if inventory_max_range_days == 0 {
            return Err(ConfigError::InvalidValue(
                "INVENTORY_MAX_RANGE_DAYS must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            server_addr,
            storage_backend,
            lock_timeout: Duration::from_millis(lock_timeout_ms),
            seed_sample_data,
            inventory_max_range_days,
        })
    }
}
