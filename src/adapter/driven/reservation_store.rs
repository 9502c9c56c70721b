use crate::adapter::database_error::query_failed;
use crate::adapter::driven::inventory_repository::inventory_day_from_row;
use crate::domain::model::{
    Guest, GuestId, GuestProfile, InventoryDay, NewReservation, Reservation, ReservationId,
    ReservationStatus, RoomTypeId,
};
use crate::domain::port::{RepositoryError, ReservationStore, ReservationTransaction};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{MySql, Pool, Row, Transaction};
use std::time::Duration;

/// MySQL上の在庫と予約台帳のトランザクションを提供する
///
/// 在庫行は `SELECT ... FOR UPDATE` で日付の昇順にロックする。
/// ロック待機の上限はセッションの `innodb_lock_wait_timeout` で設定する。
#[derive(Clone)]
pub struct MySqlReservationStore {
    pool: Pool<MySql>,
    lock_wait_timeout_secs: u64,
}

impl MySqlReservationStore {
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    /// * `lock_timeout` - 在庫行ロックの待機上限（秒単位に切り上げ、最小1秒）
    pub fn new(pool: Pool<MySql>, lock_timeout: Duration) -> Self {
        let millis = lock_timeout.as_millis();
        let secs = millis.div_ceil(1000).max(1);
        Self {
            pool,
            lock_wait_timeout_secs: u64::try_from(secs).unwrap_or(u64::MAX),
        }
    }
}

#[async_trait]
impl ReservationStore for MySqlReservationStore {
    async fn begin(&self) -> Result<Box<dyn ReservationTransaction>, RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(query_failed("トランザクション開始に失敗しました"))?;

        sqlx::query("SET SESSION innodb_lock_wait_timeout = ?")
            .bind(self.lock_wait_timeout_secs)
            .execute(&mut *tx)
            .await
            .map_err(query_failed("ロック待機時間の設定に失敗しました"))?;

        Ok(Box::new(MySqlReservationTransaction { tx }))
    }
}

/// コミットせずに破棄すると sqlx がロールバックする
pub struct MySqlReservationTransaction {
    tx: Transaction<'static, MySql>,
}

#[async_trait]
impl ReservationTransaction for MySqlReservationTransaction {
    async fn lock_range(
        &mut self,
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
            FOR UPDATE
            "#,
        )
        .bind(room_type_id.value())
        .bind(start)
        .bind(end)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(query_failed("在庫のロックに失敗しました"))?;

        rows.iter().map(inventory_day_from_row).collect()
    }

    async fn save_inventory_day(&mut self, day: &InventoryDay) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE inventories
            SET available_quantity = ?, version = version + 1
            WHERE room_type_id = ? AND date = ? AND version = ?
            "#,
        )
        .bind(day.available_quantity())
        .bind(day.room_type_id().value())
        .bind(day.date())
        .bind(day.version())
        .execute(&mut *self.tx)
        .await
        .map_err(query_failed("在庫の更新に失敗しました"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::VersionConflict {
                room_type_id: day.room_type_id(),
                date: day.date(),
            });
        }
        Ok(())
    }

    async fn upsert_guest(&mut self, profile: &GuestProfile) -> Result<Guest, RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO guests (name, email)
            VALUES (?, ?)
            ON DUPLICATE KEY UPDATE name = VALUES(name)
            "#,
        )
        .bind(profile.name())
        .bind(profile.email())
        .execute(&mut *self.tx)
        .await
        .map_err(query_failed("宿泊者の登録に失敗しました"))?;

        let row = sqlx::query("SELECT id, name, email FROM guests WHERE email = ?")
            .bind(profile.email())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(query_failed("宿泊者の取得に失敗しました"))?;

        Ok(Guest::new(
            GuestId::new(row.get("id")),
            row.get("name"),
            row.get("email"),
        ))
    }

    async fn insert_reservation(
        &mut self,
        reservation: NewReservation,
    ) -> Result<Reservation, RepositoryError> {
        let stay = reservation.stay();
        let result = sqlx::query(
            r#"
            INSERT INTO reservations
                (room_type_id, guest_id, check_in_date, check_out_date, number_of_rooms,
                 status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(reservation.room_type().id().value())
        .bind(reservation.guest().id().value())
        .bind(stay.check_in())
        .bind(stay.check_out())
        .bind(reservation.number_of_rooms())
        .bind(ReservationStatus::Confirmed.to_string())
        .bind(reservation.created_at())
        .bind(reservation.created_at())
        .execute(&mut *self.tx)
        .await
        .map_err(query_failed("予約の登録に失敗しました"))?;

        let id = i64::try_from(result.last_insert_id()).map_err(|e| {
            RepositoryError::OperationFailed(format!("予約IDの採番に失敗しました: {}", e))
        })?;
        Ok(reservation.into_reservation(ReservationId::new(id)))
    }

    async fn transition_status(
        &mut self,
        id: ReservationId,
        from: ReservationStatus,
        to: ReservationStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE reservations SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(to.to_string())
        .bind(updated_at)
        .bind(id.value())
        .bind(from.to_string())
        .execute(&mut *self.tx)
        .await
        .map_err(query_failed("予約ステータスの更新に失敗しました"))?;

        Ok(result.rows_affected() == 1)
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx
            .commit()
            .await
            .map_err(query_failed("トランザクションのコミットに失敗しました"))
    }
}
