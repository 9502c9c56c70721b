use crate::domain::error::DomainError;
use crate::domain::model::RoomTypeId;
use chrono::NaiveDate;
use uuid::Uuid;

/// アプリケーション層のエラー型
///
/// `Internal` 以外はすべて呼び出し側が対処できる想定内の結果。
/// `Internal` は詳細を持たず、詳細は発生箇所で相関IDとともにログに出力する。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApplicationError {
    /// 入力値の検証失敗
    #[error("Validation failed: {0}")]
    Validation(String),
    /// エンティティが見つからない
    #[error("Not found: {0}")]
    NotFound(String),
    /// 在庫不足（事前フィルターでの拒否と在庫ストアでの不足は区別しない）
    #[error(
        "Insufficient inventory: room_type_id={room_type_id}, date={date}, requested={requested}, available={available}"
    )]
    InsufficientInventory {
        room_type_id: RoomTypeId,
        date: NaiveDate,
        requested: u32,
        available: u32,
    },
    /// 現在の状態では要求された遷移ができない
    #[error("Invalid state: {0}")]
    InvalidState(String),
    /// ロックを経由しない更新でリビジョン番号が一致しなかった
    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),
    /// ロック待機の上限超過など、一時的に処理できない
    #[error("Temporarily unavailable: {0}")]
    Unavailable(String),
    /// 想定外の内部エラー
    #[error("Internal error (correlation_id={correlation_id})")]
    Internal { correlation_id: Uuid },
}

// From実装でエラー変換を簡潔に
impl From<DomainError> for ApplicationError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidStayPeriod {
                check_in,
                check_out,
            } => ApplicationError::Validation(format!(
                "チェックイン日({})はチェックアウト日({})より前である必要があります",
                check_in, check_out
            )),
            DomainError::CheckInInPast { check_in, today } => ApplicationError::Validation(
                format!(
                    "チェックイン日({})は本日({})以降である必要があります",
                    check_in, today
                ),
            ),
            DomainError::PeriodTooLong { nights, max_nights } => ApplicationError::Validation(
                format!(
                    "期間が長すぎます: {}泊（上限は{}泊）",
                    nights, max_nights
                ),
            ),
            DomainError::InvalidQuantity => {
                ApplicationError::Validation("客室数は1以上である必要があります".to_string())
            }
            DomainError::InvalidValue(msg) => ApplicationError::Validation(msg),
            DomainError::InsufficientInventory {
                room_type_id,
                date,
                requested,
                available,
            } => ApplicationError::InsufficientInventory {
                room_type_id,
                date,
                requested,
                available,
            },
            DomainError::InvalidReservationState {
                reservation_id,
                status,
            } => ApplicationError::InvalidState(format!(
                "予約の状態が正しくありません: reservation_id={}, 現在の状態={}",
                reservation_id, status
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ReservationId, ReservationStatus};

    #[test]
    fn test_invalid_stay_period_maps_to_validation() {
        let err = DomainError::InvalidStayPeriod {
            check_in: NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        };
        assert!(matches!(
            ApplicationError::from(err),
            ApplicationError::Validation(_)
        ));
    }

    #[test]
    fn test_date_range_errors_map_to_validation() {
        let past = DomainError::CheckInInPast {
            check_in: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            today: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        };
        assert!(matches!(
            ApplicationError::from(past),
            ApplicationError::Validation(_)
        ));

        let too_long = DomainError::PeriodTooLong {
            nights: 400,
            max_nights: 365,
        };
        match ApplicationError::from(too_long) {
            ApplicationError::Validation(msg) => assert!(msg.contains("365")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_insufficient_inventory_keeps_details() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let err = DomainError::InsufficientInventory {
            room_type_id: RoomTypeId::new(1),
            date,
            requested: 3,
            available: 1,
        };
        assert_eq!(
            ApplicationError::from(err),
            ApplicationError::InsufficientInventory {
                room_type_id: RoomTypeId::new(1),
                date,
                requested: 3,
                available: 1,
            }
        );
    }

    #[test]
    fn test_invalid_reservation_state_maps_to_invalid_state() {
        let err = DomainError::InvalidReservationState {
            reservation_id: ReservationId::new(5),
            status: ReservationStatus::Cancelled,
        };
        match ApplicationError::from(err) {
            ApplicationError::InvalidState(msg) => {
                assert!(msg.contains("reservation_id=5"));
                assert!(msg.contains("CANCELLED"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_internal_error_does_not_leak_details() {
        let correlation_id = Uuid::new_v4();
        let err = ApplicationError::Internal { correlation_id };
        assert_eq!(
            err.to_string(),
            format!("Internal error (correlation_id={})", correlation_id)
        );
    }
}
