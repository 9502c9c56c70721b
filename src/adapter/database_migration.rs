use crate::adapter::database_error::DatabaseError;
use sqlx::{MySql, Pool};

/// スキーマ作成のマイグレーション
const SCHEMA_MIGRATIONS: [(&str, &str); 4] = [
    (
        "001_create_room_types_table",
        include_str!("../../migrations/001_create_room_types_table.sql"),
    ),
    (
        "002_create_inventories_table",
        include_str!("../../migrations/002_create_inventories_table.sql"),
    ),
    (
        "003_create_guests_table",
        include_str!("../../migrations/003_create_guests_table.sql"),
    ),
    (
        "004_create_reservations_table",
        include_str!("../../migrations/004_create_reservations_table.sql"),
    ),
];

/// サンプルデータ投入（INSERT IGNORE のため何度実行しても同じ結果になる）
const SEED_MIGRATIONS: [(&str, &str); 2] = [
    (
        "005_seed_room_types",
        include_str!("../../migrations/005_seed_room_types.sql"),
    ),
    (
        "006_seed_inventories",
        include_str!("../../migrations/006_seed_inventories.sql"),
    ),
];

/// データベースマイグレーションを管理する構造体
pub struct DatabaseMigration {
    pool: Pool<MySql>,
}

impl DatabaseMigration {
    /// 新しいDatabaseMigrationインスタンスを作成
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// マイグレーションを実行
    /// べき等性を保証（CREATE TABLE IF NOT EXISTS / INSERT IGNORE）
    ///
    /// # Arguments
    /// * `seed_sample_data` - サンプルの客室タイプと90日分の在庫を投入するか
    pub async fn run(&self, seed_sample_data: bool) -> Result<(), DatabaseError> {
        let seeds: &[(&str, &str)] = if seed_sample_data {
            &SEED_MIGRATIONS
        } else {
            &[]
        };

        for (name, migration_sql) in SCHEMA_MIGRATIONS.iter().chain(seeds.iter()) {
            tracing::info!(migration = *name, "running migration");
            sqlx::query(migration_sql)
                .execute(&self.pool)
                .await
                .map_err(|e| DatabaseError::MigrationError(format!("{} failed: {}", name, e)))?;
        }

        tracing::info!("all migrations completed");
        Ok(())
    }
}
