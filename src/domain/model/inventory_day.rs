use crate::domain::error::DomainError;
use crate::domain::model::RoomTypeId;
use chrono::NaiveDate;

/// 日別在庫
/// 客室タイプと日付の組で識別され、その日の販売可能客室数を管理する
///
/// 不変条件: `0 <= available_quantity <= total_quantity`
/// すべての変更操作でこの条件を守り、事後補正は行わない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryDay {
    room_type_id: RoomTypeId,
    date: NaiveDate,
    total_quantity: u32,
    available_quantity: u32,
    version: u64,
}

/// 在庫復元の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreOutcome {
    /// 実際に復元された数量
    pub restored: u32,
    /// 総客室数で頭打ちになったかどうか
    pub clamped: bool,
}

impl InventoryDay {
    /// 新しい日別在庫を作成（空室数は総客室数と同じ）
    ///
    /// # Arguments
    /// * `room_type_id` - 客室タイプID
    /// * `date` - 日付
    /// * `total_quantity` - 総客室数
    pub fn new(room_type_id: RoomTypeId, date: NaiveDate, total_quantity: u32) -> Self {
        Self {
            room_type_id,
            date,
            total_quantity,
            available_quantity: total_quantity,
            version: 0,
        }
    }

    /// 永続化された値から日別在庫を再構築する
    ///
    /// # Returns
    /// * `Ok(InventoryDay)` - 再構築成功
    /// * `Err(DomainError::InvalidValue)` - 空室数が総客室数を超えている
    pub fn reconstruct(
        room_type_id: RoomTypeId,
        date: NaiveDate,
        total_quantity: u32,
        available_quantity: u32,
        version: u64,
    ) -> Result<Self, DomainError> {
        if available_quantity > total_quantity {
            return Err(DomainError::InvalidValue(format!(
                "空室数が総客室数を超えています: room_type_id={}, date={}, available={}, total={}",
                room_type_id, date, available_quantity, total_quantity
            )));
        }
        Ok(Self {
            room_type_id,
            date,
            total_quantity,
            available_quantity,
            version,
        })
    }

    pub fn room_type_id(&self) -> RoomTypeId {
        self.room_type_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn total_quantity(&self) -> u32 {
        self.total_quantity
    }

    pub fn available_quantity(&self) -> u32 {
        self.available_quantity
    }

    /// リビジョン番号
    /// 永続化層で更新のたびに1増える
    pub fn version(&self) -> u64 {
        self.version
    }

    /// 指定された数量の空室があるかチェック
    pub fn has_available(&self, quantity: u32) -> bool {
        self.available_quantity >= quantity
    }

    /// 空室数を減らす
    /// 呼び出し側はこの日の行ロックを保持していること
    ///
    /// # Arguments
    /// * `quantity` - 減らす数量
    ///
    /// # Returns
    /// * `Ok(())` - 成功
    /// * `Err(DomainError::InvalidQuantity)` - 数量が0
    /// * `Err(DomainError::InsufficientInventory)` - 空室不足
    pub fn decrease(&mut self, quantity: u32) -> Result<(), DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        if !self.has_available(quantity) {
            return Err(DomainError::InsufficientInventory {
                room_type_id: self.room_type_id,
                date: self.date,
                requested: quantity,
                available: self.available_quantity,
            });
        }
        self.available_quantity -= quantity;
        Ok(())
    }

    /// 空室数を増やす（予約取消時）
    /// 総客室数を超えないように上限で頭打ちにする
    ///
    /// # Arguments
    /// * `quantity` - 増やす数量
    ///
    /// # Returns
    /// * 実際に復元された数量と、上限で頭打ちになったかどうか
    pub fn increase(&mut self, quantity: u32) -> RestoreOutcome {
        let headroom = self.total_quantity - self.available_quantity;
        let restored = quantity.min(headroom);
        self.available_quantity += restored;
        RestoreOutcome {
            restored,
            clamped: restored < quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(available: u32, total: u32) -> InventoryDay {
        InventoryDay::reconstruct(
            RoomTypeId::new(1),
            NaiveDate::from_ymd_opt(2026, 2, 18).unwrap(),
            total,
            available,
            0,
        )
        .unwrap()
    }

    #[test]
    fn test_new_inventory_day_is_fully_available() {
        let inventory = InventoryDay::new(
            RoomTypeId::new(1),
            NaiveDate::from_ymd_opt(2026, 2, 18).unwrap(),
            10,
        );
        assert_eq!(inventory.available_quantity(), 10);
        assert_eq!(inventory.total_quantity(), 10);
        assert_eq!(inventory.version(), 0);
    }

    #[test]
    fn test_reconstruct_rejects_available_above_total() {
        let result = InventoryDay::reconstruct(
            RoomTypeId::new(1),
            NaiveDate::from_ymd_opt(2026, 2, 18).unwrap(),
            5,
            6,
            0,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_decrease_success() {
        let mut inventory = day(10, 10);
        inventory.decrease(3).unwrap();
        assert_eq!(inventory.available_quantity(), 7);
    }

    #[test]
    fn test_decrease_to_zero() {
        let mut inventory = day(2, 10);
        inventory.decrease(2).unwrap();
        assert_eq!(inventory.available_quantity(), 0);
    }

    #[test]
    fn test_decrease_insufficient_fails() {
        let mut inventory = day(2, 10);
        let result = inventory.decrease(3);
        assert_eq!(
            result,
            Err(DomainError::InsufficientInventory {
                room_type_id: RoomTypeId::new(1),
                date: NaiveDate::from_ymd_opt(2026, 2, 18).unwrap(),
                requested: 3,
                available: 2,
            })
        );
        assert_eq!(inventory.available_quantity(), 2); // 在庫は変わらない
    }

    #[test]
    fn test_decrease_zero_quantity_fails() {
        let mut inventory = day(2, 10);
        assert_eq!(inventory.decrease(0), Err(DomainError::InvalidQuantity));
    }

    #[test]
    fn test_increase_restores_quantity() {
        let mut inventory = day(7, 10);
        let outcome = inventory.increase(3);
        assert_eq!(inventory.available_quantity(), 10);
        assert_eq!(
            outcome,
            RestoreOutcome {
                restored: 3,
                clamped: false
            }
        );
    }

    #[test]
    fn test_increase_is_clamped_at_total() {
        let mut inventory = day(9, 10);
        let outcome = inventory.increase(3);
        assert_eq!(inventory.available_quantity(), 10);
        assert_eq!(
            outcome,
            RestoreOutcome {
                restored: 1,
                clamped: true
            }
        );
    }
}
