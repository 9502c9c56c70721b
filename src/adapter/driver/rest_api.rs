use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Json,
    routing::{get, patch, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::adapter::driver::request_dto::{
    AvailabilityQueryParams, CreateReservationRequest, OpenInventoryRequest,
};
use crate::adapter::driver::response_dto::{
    DailyAvailabilityResponse, InventoryResponse, OpenInventoryResponse, ReservationResponse,
};
use crate::application::service::{
    CreateReservationCommand, InventoryApplicationService, ReservationApplicationService,
};
use crate::application::ApplicationError;
use crate::domain::model::{ReservationId, RoomTypeId};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

// アプリケーションサービスを含む状態
#[derive(Clone)]
pub struct AppState {
    pub reservation_service: Arc<ReservationApplicationService>,
    pub inventory_service: Arc<InventoryApplicationService>,
}

// REST APIルーターを作成
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/reservations", post(create_reservation))
        .route("/api/v1/reservations/:reservation_id", get(get_reservation))
        .route(
            "/api/v1/reservations/:reservation_id/cancel",
            patch(cancel_reservation),
        )
        .route(
            "/api/v1/inventory",
            get(get_availability).post(open_inventory),
        )
}

// ヘルスチェックエンドポイント
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "hotel-inventory-reservation",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// 予約作成エンドポイント
async fn create_reservation(
    State(state): State<AppState>,
    request: Result<Json<CreateReservationRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ReservationResponse>)> {
    let Json(request) = request.map_err(|e| bad_request(e.body_text()))?;

    let command = CreateReservationCommand {
        room_type_id: RoomTypeId::new(request.room_type_id),
        guest_name: request.guest_name,
        guest_email: request.guest_email,
        check_in_date: request.check_in_date,
        check_out_date: request.check_out_date,
        number_of_rooms: request.number_of_rooms,
    };

    match state.reservation_service.create_reservation(command).await {
        Ok(reservation) => Ok((
            StatusCode::CREATED,
            Json(ReservationResponse::from_reservation(&reservation)),
        )),
        Err(err) => Err(map_application_error(err)),
    }
}

// 予約取得エンドポイント
async fn get_reservation(
    State(state): State<AppState>,
    reservation_id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<ReservationResponse>> {
    let Path(reservation_id) =
        reservation_id.map_err(|_| bad_request("無効な予約ID形式です".to_string()))?;

    match state
        .reservation_service
        .get_reservation(ReservationId::new(reservation_id))
        .await
    {
        Ok(reservation) => Ok(Json(ReservationResponse::from_reservation(&reservation))),
        Err(err) => Err(map_application_error(err)),
    }
}

// 予約取消エンドポイント
async fn cancel_reservation(
    State(state): State<AppState>,
    reservation_id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<ReservationResponse>> {
    let Path(reservation_id) =
        reservation_id.map_err(|_| bad_request("無効な予約ID形式です".to_string()))?;

    match state
        .reservation_service
        .cancel_reservation(ReservationId::new(reservation_id))
        .await
    {
        Ok(reservation) => Ok(Json(ReservationResponse::from_reservation(&reservation))),
        Err(err) => Err(map_application_error(err)),
    }
}

// 空室照会エンドポイント
async fn get_availability(
    State(state): State<AppState>,
    query: Result<Query<AvailabilityQueryParams>, QueryRejection>,
) -> ApiResult<Json<InventoryResponse>> {
    let Query(params) = query.map_err(|_| {
        bad_request(
            "room_type_id, check_in_date, check_out_date は必須です（日付は YYYY-MM-DD 形式）"
                .to_string(),
        )
    })?;

    match state
        .inventory_service
        .get_availability(
            RoomTypeId::new(params.room_type_id),
            params.check_in_date,
            params.check_out_date,
        )
        .await
    {
        Ok(availability) => Ok(Json(InventoryResponse::from_availability(&availability))),
        Err(err) => Err(map_application_error(err)),
    }
}

// 日別在庫登録エンドポイント
async fn open_inventory(
    State(state): State<AppState>,
    request: Result<Json<OpenInventoryRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<OpenInventoryResponse>)> {
    let Json(request) = request.map_err(|e| bad_request(e.body_text()))?;

    match state
        .inventory_service
        .open_inventory(
            RoomTypeId::new(request.room_type_id),
            request.from_date,
            request.to_date,
            request.total_quantity,
        )
        .await
    {
        Ok(created) => Ok((
            StatusCode::CREATED,
            Json(OpenInventoryResponse {
                room_type_id: request.room_type_id,
                created: created
                    .iter()
                    .map(DailyAvailabilityResponse::from_inventory_day)
                    .collect(),
            }),
        )),
        Err(err) => Err(map_application_error(err)),
    }
}

fn bad_request(message: String) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError {
            error: message,
            code: "INVALID_REQUEST".to_string(),
        }),
    )
}

// アプリケーションエラーをHTTPエラーにマッピング
fn map_application_error(err: ApplicationError) -> (StatusCode, Json<ApiError>) {
    let (status, code) = match &err {
        ApplicationError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        ApplicationError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        ApplicationError::InsufficientInventory { .. } => {
            (StatusCode::CONFLICT, "INSUFFICIENT_INVENTORY")
        }
        ApplicationError::InvalidState(_) => (StatusCode::CONFLICT, "INVALID_RESERVATION_STATE"),
        ApplicationError::ConcurrencyConflict(_) => (StatusCode::CONFLICT, "CONCURRENCY_CONFLICT"),
        ApplicationError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
        ApplicationError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    };

    let error = match err {
        ApplicationError::Validation(msg)
        | ApplicationError::NotFound(msg)
        | ApplicationError::InvalidState(msg)
        | ApplicationError::ConcurrencyConflict(msg)
        | ApplicationError::Unavailable(msg) => msg,
        ApplicationError::InsufficientInventory {
            room_type_id,
            date,
            requested,
            available,
        } => format!(
            "在庫が不足しています: room_type_id={}, date={}, requested={}, available={}",
            room_type_id, date, requested, available
        ),
        // 詳細はログにのみ出力し、問い合わせ用の相関IDだけを返す
        ApplicationError::Internal { correlation_id } => format!(
            "内部エラーが発生しました (correlation_id={})",
            correlation_id
        ),
    };

    (
        status,
        Json(ApiError {
            error,
            code: code.to_string(),
        }),
    )
}

#[cfg(test)]
mod error_handling_tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    #[test]
    fn test_map_application_error_not_found() {
        let app_error = ApplicationError::NotFound("予約が見つかりません".to_string());
        let (status, Json(api_error)) = map_application_error(app_error);

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(api_error.code, "NOT_FOUND");
        assert_eq!(api_error.error, "予約が見つかりません");
    }

    #[test]
    fn test_map_application_error_conflicts() {
        let insufficient = ApplicationError::InsufficientInventory {
            room_type_id: RoomTypeId::new(1),
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            requested: 2,
            available: 0,
        };
        let (status, Json(api_error)) = map_application_error(insufficient);
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(api_error.code, "INSUFFICIENT_INVENTORY");
        assert!(api_error.error.contains("2026-03-01"));

        let (status, _) =
            map_application_error(ApplicationError::InvalidState("CANCELLED".to_string()));
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) =
            map_application_error(ApplicationError::ConcurrencyConflict("retry".to_string()));
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[test]
    fn test_map_application_error_unavailable() {
        let (status, Json(api_error)) =
            map_application_error(ApplicationError::Unavailable("busy".to_string()));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(api_error.code, "SERVICE_UNAVAILABLE");
    }

    #[test]
    fn test_map_application_error_internal_is_generic() {
        let correlation_id = Uuid::new_v4();
        let (status, Json(api_error)) =
            map_application_error(ApplicationError::Internal { correlation_id });

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api_error.code, "INTERNAL_ERROR");
        assert!(api_error.error.contains(&correlation_id.to_string()));
    }

    #[test]
    fn test_api_error_structure() {
        let api_error = ApiError {
            error: "テストエラー".to_string(),
            code: "TEST_ERROR".to_string(),
        };

        let json = serde_json::to_string(&api_error).unwrap();
        assert!(json.contains("テストエラー"));
        assert!(json.contains("TEST_ERROR"));
    }
}
