// アプリケーションサービス
// 予約の作成・取消、在庫照会、在庫カウンターの初期化

mod counter_initializer;
mod inventory_service;
mod reservation_service;

pub use counter_initializer::InventoryCounterInitializer;
pub use inventory_service::{InventoryApplicationService, RoomAvailability};
pub use reservation_service::{CreateReservationCommand, ReservationApplicationService};

use crate::application::ApplicationError;
use crate::domain::port::RepositoryError;
use uuid::Uuid;

/// リポジトリエラーをアプリケーションエラーに分類する
///
/// ロック待機の上限超過は `Unavailable`、リビジョン番号の不一致は
/// `ConcurrencyConflict` として呼び出し側に返す。それ以外は想定外の障害として
/// 詳細をログに出力し、詳細を含まない `Internal` を返す。
pub(crate) fn map_repository_error(
    err: RepositoryError,
    correlation_id: Uuid,
    component: &'static str,
) -> ApplicationError {
    match err {
        RepositoryError::LockTimeout(msg) => {
            tracing::warn!(
                component,
                %correlation_id,
                reason = %msg,
                "inventory lock wait exceeded the configured bound"
            );
            ApplicationError::Unavailable(
                "サーバーが一時的に混雑しています。しばらくしてから再度お試しください".to_string(),
            )
        }
        RepositoryError::VersionConflict { room_type_id, date } => {
            tracing::warn!(
                component,
                %correlation_id,
                %room_type_id,
                %date,
                "inventory revision mismatch on write"
            );
            ApplicationError::ConcurrencyConflict(format!(
                "同時更新の競合が発生しました。再度お試しください: room_type_id={}, date={}",
                room_type_id, date
            ))
        }
        other => {
            tracing::error!(
                component,
                %correlation_id,
                error = %other,
                "unexpected repository failure"
            );
            ApplicationError::Internal { correlation_id }
        }
    }
}
