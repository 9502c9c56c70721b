use crate::application::service::map_repository_error;
use crate::application::ApplicationError;
use crate::domain::counter::InventoryCounter;
use crate::domain::error::DomainError;
use crate::domain::model::{
    GuestProfile, InventoryDay, NewReservation, Reservation, ReservationId, ReservationStatus,
    RoomType, RoomTypeId, StayPeriod,
};
use crate::domain::port::{
    Clock, RepositoryError, ReservationRepository, ReservationStore, RoomTypeRepository,
};
use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

const COMPONENT: &str = "ReservationCoordinator";

/// 1件の予約で指定できる最大宿泊数
pub const MAX_STAY_NIGHTS: usize = 365;

/// 予約作成コマンド
#[derive(Debug, Clone)]
pub struct CreateReservationCommand {
    pub room_type_id: RoomTypeId,
    pub guest_name: String,
    pub guest_email: String,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub number_of_rooms: u32,
}

/// 予約アプリケーションサービス
///
/// 在庫カウンター（事前フィルター）、正となる在庫ストア、予約台帳を調整して
/// 予約の作成と取消を行う。2つの整合性ドメインをまたぐため、単一の
/// トランザクションではなく「実行・検証・失敗時の補償」の順で処理する。
pub struct ReservationApplicationService {
    room_type_repository: Arc<dyn RoomTypeRepository>,
    reservation_repository: Arc<dyn ReservationRepository>,
    reservation_store: Arc<dyn ReservationStore>,
    counter: Arc<InventoryCounter>,
    clock: Arc<dyn Clock>,
}

impl ReservationApplicationService {
    /// 新しい予約アプリケーションサービスを作成
    ///
    /// # Arguments
    /// * `room_type_repository` - 客室タイプリポジトリ
    /// * `reservation_repository` - 予約リポジトリ（読み取り）
    /// * `reservation_store` - 在庫と予約台帳のトランザクション
    /// * `counter` - 在庫カウンター
    /// * `clock` - チェックイン日の検証に使う時計
    pub fn new(
        room_type_repository: Arc<dyn RoomTypeRepository>,
        reservation_repository: Arc<dyn ReservationRepository>,
        reservation_store: Arc<dyn ReservationStore>,
        counter: Arc<InventoryCounter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            room_type_repository,
            reservation_repository,
            reservation_store,
            counter,
            clock,
        }
    }

    /// 予約を作成
    ///
    /// 1. 宿泊期間（本日以降・最大宿泊数以内）・客室数・宿泊者情報を検証
    /// 2. 客室タイプの存在を確認
    /// 3. 在庫カウンターで仮押さえ（拒否された場合は在庫ストアに触れずに即座に失敗）
    /// 4. 在庫ストアで期間の行を昇順にロックし、全日付の空室を検証
    /// 5. 在庫を減算し、CONFIRMED の予約を台帳に追加してコミット
    /// 6. 4以降で失敗した場合は仮押さえをカウンターに戻してからエラーを返す
    ///
    /// # Returns
    /// * `Ok(Reservation)` - 作成された予約
    /// * `Err(ApplicationError)` - 作成失敗
    pub async fn create_reservation(
        &self,
        command: CreateReservationCommand,
    ) -> Result<Reservation, ApplicationError> {
        let correlation_id = Uuid::new_v4();

        let stay = StayPeriod::new(command.check_in_date, command.check_out_date)?;
        stay.ensure_not_before(self.clock.today())?;
        stay.ensure_at_most(MAX_STAY_NIGHTS)?;
        if command.number_of_rooms == 0 {
            return Err(DomainError::InvalidQuantity.into());
        }
        let quantity = command.number_of_rooms;
        let profile = GuestProfile::new(command.guest_name, command.guest_email)?;
        self.ensure_counter_ready(correlation_id)?;

        let room_type = self
            .room_type_repository
            .find_by_id(command.room_type_id)
            .await
            .map_err(|e| map_repository_error(e, correlation_id, COMPONENT))?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!(
                    "客室タイプが見つかりません: room_type_id={}",
                    command.room_type_id
                ))
            })?;
        let room_type_id = room_type.id();

        let Some(admission) = self.counter.admit(room_type_id, stay.dates(), quantity) else {
            tracing::debug!(
                component = COMPONENT,
                %correlation_id,
                %room_type_id,
                %stay,
                quantity,
                "rejected by inventory counter"
            );
            return Err(ApplicationError::InsufficientInventory {
                room_type_id,
                date: stay.check_in(),
                requested: quantity,
                available: 0,
            });
        };

        match self
            .persist_confirmed(correlation_id, room_type, profile, stay, quantity)
            .await
        {
            Ok(reservation) => {
                admission.confirm();
                tracing::info!(
                    component = COMPONENT,
                    %correlation_id,
                    %room_type_id,
                    reservation_id = %reservation.id(),
                    %stay,
                    quantity,
                    "reservation confirmed"
                );
                Ok(reservation)
            }
            Err(err) => {
                // 仮押さえを戻してカウンターを在庫ストアと一致させる
                drop(admission);
                tracing::info!(
                    component = COMPONENT,
                    %correlation_id,
                    %room_type_id,
                    %stay,
                    quantity,
                    error = %err,
                    "reservation failed after admission, counter compensated"
                );
                Err(err)
            }
        }
    }

    /// 予約を取得
    ///
    /// # Returns
    /// * `Ok(Reservation)` - 予約が見つかった
    /// * `Err(ApplicationError::NotFound)` - 予約が見つからなかった
    pub async fn get_reservation(&self, id: ReservationId) -> Result<Reservation, ApplicationError> {
        let correlation_id = Uuid::new_v4();
        self.reservation_repository
            .find_by_id(id)
            .await
            .map_err(|e| map_repository_error(e, correlation_id, COMPONENT))?
            .ok_or_else(|| reservation_not_found(id))
    }

    /// 予約を取り消す
    ///
    /// 1. CONFIRMED 状態であることを確認（取消済みの再取消はエラー）
    /// 2. 予約期間の在庫行を昇順にロックし、ステータスを CANCELLED に遷移
    /// 3. 客室数を復元（総客室数が上限）してコミット
    /// 4. 実際に復元した数量だけ在庫カウンターに戻す
    ///
    /// 2〜3のどこかで失敗した場合はトランザクションがロールバックされ、
    /// 予約は CONFIRMED のまま、在庫も変更されない。
    pub async fn cancel_reservation(
        &self,
        id: ReservationId,
    ) -> Result<Reservation, ApplicationError> {
        let correlation_id = Uuid::new_v4();
        let map_err = move |e: RepositoryError| map_repository_error(e, correlation_id, COMPONENT);

        let mut reservation = self
            .reservation_repository
            .find_by_id(id)
            .await
            .map_err(map_err)?
            .ok_or_else(|| reservation_not_found(id))?;
        reservation.ensure_cancellable()?;

        let room_type_id = reservation.room_type().id();
        let stay = reservation.stay();
        let quantity = reservation.number_of_rooms();

        let mut tx = self.reservation_store.begin().await.map_err(map_err)?;
        let mut days = tx
            .lock_range(room_type_id, stay.check_in(), stay.check_out())
            .await
            .map_err(map_err)?;
        // 同じ予約への取消は在庫行のロックで直列化される
        reservation.cancel()?;
        let transitioned = tx
            .transition_status(
                id,
                ReservationStatus::Confirmed,
                ReservationStatus::Cancelled,
                reservation.updated_at(),
            )
            .await
            .map_err(map_err)?;
        if !transitioned {
            return Err(ApplicationError::InvalidState(format!(
                "予約の状態が正しくありません: reservation_id={}, 現在の状態={}",
                id,
                ReservationStatus::Cancelled
            )));
        }

        if days.len() != stay.nights() {
            tracing::warn!(
                component = COMPONENT,
                %correlation_id,
                reservation_id = %id,
                %stay,
                found = days.len(),
                "inventory rows missing for cancelled stay"
            );
        }

        let mut restored: Vec<(NaiveDate, u32)> = Vec::with_capacity(days.len());
        for day in days.iter_mut() {
            let outcome = day.increase(quantity);
            if outcome.clamped {
                tracing::error!(
                    component = COMPONENT,
                    %correlation_id,
                    reservation_id = %id,
                    %room_type_id,
                    date = %day.date(),
                    requested = quantity,
                    restored = outcome.restored,
                    total = day.total_quantity(),
                    invariant_violation = true,
                    "inventory restore clamped at total quantity"
                );
            }
            tx.save_inventory_day(day).await.map_err(map_err)?;
            restored.push((day.date(), outcome.restored));
        }

        tx.commit().await.map_err(map_err)?;

        for (date, amount) in &restored {
            self.counter.release(room_type_id, &[*date], *amount);
        }

        tracing::info!(
            component = COMPONENT,
            %correlation_id,
            reservation_id = %id,
            %room_type_id,
            %stay,
            quantity,
            "reservation cancelled"
        );
        Ok(reservation)
    }

    fn ensure_counter_ready(&self, correlation_id: Uuid) -> Result<(), ApplicationError> {
        if self.counter.is_initialized() {
            return Ok(());
        }
        tracing::warn!(
            component = COMPONENT,
            %correlation_id,
            "request received before inventory counter initialization"
        );
        Err(ApplicationError::Unavailable(
            "在庫カウンターの初期化が完了していません".to_string(),
        ))
    }

    /// 在庫ストアで在庫を減算し、予約を台帳に追加する
    async fn persist_confirmed(
        &self,
        correlation_id: Uuid,
        room_type: RoomType,
        profile: GuestProfile,
        stay: StayPeriod,
        quantity: u32,
    ) -> Result<Reservation, ApplicationError> {
        let map_err = move |e: RepositoryError| map_repository_error(e, correlation_id, COMPONENT);

        let mut tx = self.reservation_store.begin().await.map_err(map_err)?;
        let mut days = tx
            .lock_range(room_type.id(), stay.check_in(), stay.check_out())
            .await
            .map_err(map_err)?;
        verify_range(room_type.id(), &stay, &days, quantity)?;

        for day in days.iter_mut() {
            day.decrease(quantity)?;
            tx.save_inventory_day(day).await.map_err(map_err)?;
        }

        let guest = tx.upsert_guest(&profile).await.map_err(map_err)?;
        let new_reservation = NewReservation::confirmed(room_type, guest, stay, quantity)?;
        let reservation = tx
            .insert_reservation(new_reservation)
            .await
            .map_err(map_err)?;
        tx.commit().await.map_err(map_err)?;

        Ok(reservation)
    }
}

/// ロックした在庫が宿泊期間の全日付を含み、すべての日付に十分な空室があるか検証する
/// 日付が欠けている場合も在庫不足として扱う（部分的な成功にはしない）
fn verify_range(
    room_type_id: RoomTypeId,
    stay: &StayPeriod,
    days: &[InventoryDay],
    quantity: u32,
) -> Result<(), DomainError> {
    let mut locked = days.iter();
    for expected in stay.dates() {
        match locked.next() {
            Some(day) if day.date() == expected => {
                if !day.has_available(quantity) {
                    return Err(DomainError::InsufficientInventory {
                        room_type_id,
                        date: day.date(),
                        requested: quantity,
                        available: day.available_quantity(),
                    });
                }
            }
            _ => {
                return Err(DomainError::InsufficientInventory {
                    room_type_id,
                    date: expected,
                    requested: quantity,
                    available: 0,
                })
            }
        }
    }
    Ok(())
}

fn reservation_not_found(id: ReservationId) -> ApplicationError {
    ApplicationError::NotFound(format!("予約が見つかりません: reservation_id={}", id))
}
