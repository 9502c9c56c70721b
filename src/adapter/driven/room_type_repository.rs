use crate::adapter::database_error::query_failed;
use crate::domain::model::{RoomType, RoomTypeId};
use crate::domain::port::{RepositoryError, RoomTypeRepository};
use async_trait::async_trait;
use sqlx::{MySql, Pool, Row};

/// MySQL客室タイプリポジトリ
#[derive(Clone)]
pub struct MySqlRoomTypeRepository {
    pool: Pool<MySql>,
}

impl MySqlRoomTypeRepository {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomTypeRepository for MySqlRoomTypeRepository {
    async fn find_by_id(&self, id: RoomTypeId) -> Result<Option<RoomType>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, hotel_id, name, max_occupancy FROM room_types WHERE id = ?",
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed("客室タイプの取得に失敗しました"))?;

        Ok(row.map(|row| {
            RoomType::new(
                RoomTypeId::new(row.get("id")),
                row.get("hotel_id"),
                row.get("name"),
                row.get::<u32, _>("max_occupancy"),
            )
        }))
    }
}
