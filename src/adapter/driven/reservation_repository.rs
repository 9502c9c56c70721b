use crate::adapter::database_error::query_failed;
use crate::domain::model::{
    Guest, GuestId, Reservation, ReservationId, ReservationStatus, RoomType, RoomTypeId,
    StayPeriod,
};
use crate::domain::port::{RepositoryError, ReservationRepository};
use async_trait::async_trait;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, Row};

/// 予約と客室タイプ・宿泊者を結合して取得するクエリ
const SELECT_RESERVATION: &str = r#"
    SELECT
        r.id, r.check_in_date, r.check_out_date, r.number_of_rooms, r.status,
        r.created_at, r.updated_at,
        rt.id AS room_type_id, rt.hotel_id, rt.name AS room_type_name, rt.max_occupancy,
        g.id AS guest_id, g.name AS guest_name, g.email AS guest_email
    FROM reservations r
    JOIN room_types rt ON rt.id = r.room_type_id
    JOIN guests g ON g.id = r.guest_id
    WHERE r.id = ?
"#;

/// MySQL予約リポジトリ
#[derive(Clone)]
pub struct MySqlReservationRepository {
    pool: Pool<MySql>,
}

impl MySqlReservationRepository {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

/// 結合済みの行から予約を再構築する
fn reservation_from_row(row: &MySqlRow) -> Result<Reservation, RepositoryError> {
    let room_type = RoomType::new(
        RoomTypeId::new(row.get("room_type_id")),
        row.get("hotel_id"),
        row.get("room_type_name"),
        row.get::<u32, _>("max_occupancy"),
    );
    let guest = Guest::new(
        GuestId::new(row.get("guest_id")),
        row.get("guest_name"),
        row.get("guest_email"),
    );

    let stay = StayPeriod::new(row.get("check_in_date"), row.get("check_out_date"))
        .map_err(|e| RepositoryError::FetchFailed(format!("宿泊期間の解析に失敗しました: {}", e)))?;
    let status = ReservationStatus::from_string(row.get("status")).map_err(|e| {
        RepositoryError::FetchFailed(format!("予約ステータスの解析に失敗しました: {}", e))
    })?;

    Reservation::reconstruct(
        ReservationId::new(row.get("id")),
        room_type,
        guest,
        stay,
        row.get::<u32, _>("number_of_rooms"),
        status,
        row.get("created_at"),
        row.get("updated_at"),
    )
    .map_err(|e| RepositoryError::FetchFailed(format!("予約の再構築に失敗しました: {}", e)))
}

#[async_trait]
impl ReservationRepository for MySqlReservationRepository {
    async fn find_by_id(&self, id: ReservationId) -> Result<Option<Reservation>, RepositoryError> {
        let row = sqlx::query(SELECT_RESERVATION)
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed("予約の取得に失敗しました"))?;

        row.as_ref().map(reservation_from_row).transpose()
    }
}
