use chrono::NaiveDate;

use crate::domain::model::{ReservationId, ReservationStatus, RoomTypeId};

/// ドメイン層のエラー型
/// ビジネスルール違反を表現する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// 無効な宿泊期間（チェックイン日がチェックアウト日より前でない）
    #[error("Invalid stay period: check-in {check_in} must be before check-out {check_out}")]
    InvalidStayPeriod {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },
    /// 過去の日付からの宿泊
    #[error("Check-in {check_in} is before today ({today})")]
    CheckInInPast {
        check_in: NaiveDate,
        today: NaiveDate,
    },
    /// 期間が長すぎる
    #[error("Period of {nights} nights exceeds the maximum of {max_nights}")]
    PeriodTooLong { nights: usize, max_nights: usize },
    /// 無効な数量（例: 0以下の客室数）
    #[error("Invalid quantity")]
    InvalidQuantity,
    /// 無効な値
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    /// 在庫不足
    #[error(
        "Insufficient inventory: room_type_id={room_type_id}, date={date}, requested={requested}, available={available}"
    )]
    InsufficientInventory {
        room_type_id: RoomTypeId,
        date: NaiveDate,
        requested: u32,
        available: u32,
    },
    /// 無効な予約状態（例: 取消済みの予約を再度取り消そうとした）
    #[error("Invalid reservation state: reservation_id={reservation_id}, status={status}")]
    InvalidReservationState {
        reservation_id: ReservationId,
        status: ReservationStatus,
    },
}
