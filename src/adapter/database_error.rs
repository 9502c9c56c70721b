use crate::domain::port::RepositoryError;
use sqlx::mysql::MySqlDatabaseError;

/// InnoDB のロック待機タイムアウト
const ER_LOCK_WAIT_TIMEOUT: u16 = 1205;
/// InnoDB のデッドロック検出
const ER_LOCK_DEADLOCK: u16 = 1213;

/// データベースエラー型
/// データベース操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DatabaseError {
    /// データベース接続エラー
    #[error("Database connection error: {0}")]
    ConnectionError(String),
    /// SQLクエリエラー
    #[error("Database query error: {0}")]
    QueryError(String),
    /// ロック待機の上限超過（デッドロックによる中断を含む）
    #[error("Database lock wait exceeded: {0}")]
    LockWaitTimeout(String),
    /// マイグレーションエラー
    #[error("Migration error: {0}")]
    MigrationError(String),
}

impl DatabaseError {
    /// sqlx のエラーを分類する
    pub fn classify(err: sqlx::Error) -> Self {
        if let Some(code) = mysql_error_number(&err) {
            if code == ER_LOCK_WAIT_TIMEOUT || code == ER_LOCK_DEADLOCK {
                return DatabaseError::LockWaitTimeout(err.to_string());
            }
        }
        match err {
            sqlx::Error::PoolTimedOut => {
                DatabaseError::LockWaitTimeout("connection pool acquire timed out".to_string())
            }
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolClosed => {
                DatabaseError::ConnectionError(err.to_string())
            }
            other => DatabaseError::QueryError(other.to_string()),
        }
    }
}

fn mysql_error_number(err: &sqlx::Error) -> Option<u16> {
    err.as_database_error()
        .and_then(|db| db.try_downcast_ref::<MySqlDatabaseError>())
        .map(|mysql| mysql.number())
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        DatabaseError::classify(err)
    }
}

/// DatabaseErrorからRepositoryErrorへの変換
impl From<DatabaseError> for RepositoryError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ConnectionError(msg) => RepositoryError::ConnectionFailed(msg),
            DatabaseError::QueryError(msg) => RepositoryError::OperationFailed(msg),
            DatabaseError::LockWaitTimeout(msg) => RepositoryError::LockTimeout(msg),
            DatabaseError::MigrationError(msg) => RepositoryError::OperationFailed(msg),
        }
    }
}

/// sqlx のエラーを分類してリポジトリエラーに変換する
/// クエリエラーには操作内容を前置する
pub(crate) fn query_failed(context: &'static str) -> impl Fn(sqlx::Error) -> RepositoryError {
    move |err| match DatabaseError::classify(err) {
        DatabaseError::QueryError(msg) => {
            DatabaseError::QueryError(format!("{}: {}", context, msg)).into()
        }
        other => other.into(),
    }
}
