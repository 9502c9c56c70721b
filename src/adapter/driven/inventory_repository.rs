use crate::adapter::database_error::query_failed;
use crate::domain::model::{InventoryDay, RoomTypeId};
use crate::domain::port::{InventoryRepository, RepositoryError};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, Row};

/// MySQL在庫リポジトリ
/// 日別在庫をロックせずに読み取る。ロックを伴う更新は `MySqlReservationStore` が行う
#[derive(Clone)]
pub struct MySqlInventoryRepository {
    pool: Pool<MySql>,
}

impl MySqlInventoryRepository {
    /// 新しいMySQL在庫リポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

/// inventories テーブルの行から日別在庫を再構築する
pub(super) fn inventory_day_from_row(row: &MySqlRow) -> Result<InventoryDay, RepositoryError> {
    InventoryDay::reconstruct(
        RoomTypeId::new(row.get("room_type_id")),
        row.get("date"),
        row.get::<u32, _>("total_quantity"),
        row.get::<u32, _>("available_quantity"),
        row.get::<u64, _>("version"),
    )
    .map_err(|e| RepositoryError::FetchFailed(format!("日別在庫の再構築に失敗しました: {}", e)))
}

#[async_trait]
impl InventoryRepository for MySqlInventoryRepository {
    async fn find_all(&self) -> Result<Vec<InventoryDay>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT room_type_id, date, total_quantity, available_quantity, version
            FROM inventories
            ORDER BY room_type_id ASC, date ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed("在庫一覧の取得に失敗しました"))?;

        rows.iter().map(inventory_day_from_row).collect()
    }

    async fn find_by_room_type_and_range(
        &self,
        room_type_id: RoomTypeId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<InventoryDay>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT room_type_id, date, total_quantity, available_quantity, version
            FROM inventories
            WHERE room_type_id = ? AND date >= ? AND date < ?
            ORDER BY date ASC
            "#,
        )
        .bind(room_type_id.value())
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed("在庫の取得に失敗しました"))?;

        rows.iter().map(inventory_day_from_row).collect()
    }

    async fn insert_missing(
        &self,
        days: Vec<InventoryDay>,
    ) -> Result<Vec<InventoryDay>, RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(query_failed("トランザクション開始に失敗しました"))?;

        // 既存の日付は INSERT IGNORE で読み飛ばし、実際に追加された行だけを返す
        let mut created = Vec::new();
        for day in days {
            let result = sqlx::query(
                r#"
                INSERT IGNORE INTO inventories
                    (room_type_id, date, total_quantity, available_quantity, version)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(day.room_type_id().value())
            .bind(day.date())
            .bind(day.total_quantity())
            .bind(day.available_quantity())
            .bind(day.version())
            .execute(&mut *tx)
            .await
            .map_err(query_failed("日別在庫の登録に失敗しました"))?;

            if result.rows_affected() == 1 {
                created.push(day);
            }
        }

        tx.commit()
            .await
            .map_err(query_failed("トランザクションのコミットに失敗しました"))?;

        Ok(created)
    }
}
