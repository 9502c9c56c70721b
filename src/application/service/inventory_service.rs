use crate::application::service::map_repository_error;
use crate::application::ApplicationError;
use crate::domain::counter::{CounterSnapshot, InventoryCounter};
use crate::domain::error::DomainError;
use crate::domain::model::{InventoryDay, RoomType, RoomTypeId, StayPeriod};
use crate::domain::port::{InventoryRepository, RoomTypeRepository};
use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

const COMPONENT: &str = "InventoryService";

/// 客室タイプの期間内の空室状況
#[derive(Debug, Clone, PartialEq)]
pub struct RoomAvailability {
    pub room_type: RoomType,
    pub period: StayPeriod,
    pub days: Vec<InventoryDay>,
}

/// 在庫アプリケーションサービス
/// 空室照会と日別在庫の登録を扱う
pub struct InventoryApplicationService {
    room_type_repository: Arc<dyn RoomTypeRepository>,
    inventory_repository: Arc<dyn InventoryRepository>,
    counter: Arc<InventoryCounter>,
    max_range_days: usize,
}

impl InventoryApplicationService {
    /// # Arguments
    /// * `max_range_days` - 照会・登録で一度に指定できる最大日数
    pub fn new(
        room_type_repository: Arc<dyn RoomTypeRepository>,
        inventory_repository: Arc<dyn InventoryRepository>,
        counter: Arc<InventoryCounter>,
        max_range_days: usize,
    ) -> Self {
        Self {
            room_type_repository,
            inventory_repository,
            counter,
            max_range_days,
        }
    }

    /// 空室状況を照会
    ///
    /// 在庫ストアの値をロックせずに読み取る。返した直後に変わっている可能性があり、
    /// 予約の可否判断には使わない。
    ///
    /// # Arguments
    /// * `room_type_id` - 客室タイプID
    /// * `check_in` - 期間の開始日（含む）
    /// * `check_out` - 期間の終了日（含まない）
    pub async fn get_availability(
        &self,
        room_type_id: RoomTypeId,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<RoomAvailability, ApplicationError> {
        let correlation_id = Uuid::new_v4();
        let period = StayPeriod::new(check_in, check_out)?;
        period.ensure_at_most(self.max_range_days)?;
        let room_type = self.find_room_type(room_type_id, correlation_id).await?;

        let days = self
            .inventory_repository
            .find_by_room_type_and_range(room_type_id, period.check_in(), period.check_out())
            .await
            .map_err(|e| map_repository_error(e, correlation_id, COMPONENT))?;

        Ok(RoomAvailability {
            room_type,
            period,
            days,
        })
    }

    /// 日別在庫を登録
    ///
    /// 期間内で在庫行が存在しない日付だけを `total_quantity` 室で作成し、
    /// 在庫カウンターにも同じ日付だけを登録する。既存の日付は変更しない。
    ///
    /// # Returns
    /// * `Ok(Vec<InventoryDay>)` - 新たに作成された日別在庫
    /// * `Err(ApplicationError)` - 登録失敗
    pub async fn open_inventory(
        &self,
        room_type_id: RoomTypeId,
        from: NaiveDate,
        to: NaiveDate,
        total_quantity: u32,
    ) -> Result<Vec<InventoryDay>, ApplicationError> {
        let correlation_id = Uuid::new_v4();
        let period = StayPeriod::new(from, to)?;
        period.ensure_at_most(self.max_range_days)?;
        if total_quantity == 0 {
            return Err(DomainError::InvalidQuantity.into());
        }
        self.find_room_type(room_type_id, correlation_id).await?;

        let days = period
            .dates()
            .into_iter()
            .map(|date| InventoryDay::new(room_type_id, date, total_quantity))
            .collect();
        let created = self
            .inventory_repository
            .insert_missing(days)
            .await
            .map_err(|e| map_repository_error(e, correlation_id, COMPONENT))?;

        let registered = self
            .counter
            .register(created.iter().map(CounterSnapshot::from));
        tracing::info!(
            component = COMPONENT,
            %correlation_id,
            %room_type_id,
            %period,
            created = created.len(),
            registered,
            "inventory opened"
        );
        Ok(created)
    }

    async fn find_room_type(
        &self,
        room_type_id: RoomTypeId,
        correlation_id: Uuid,
    ) -> Result<RoomType, ApplicationError> {
        self.room_type_repository
            .find_by_id(room_type_id)
            .await
            .map_err(|e| map_repository_error(e, correlation_id, COMPONENT))?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!(
                    "客室タイプが見つかりません: room_type_id={}",
                    room_type_id
                ))
            })
    }
}
