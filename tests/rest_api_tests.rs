use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{NaiveDate, TimeZone, Utc};
use hotel_inventory_reservation::adapter::driven::{FixedClock, InMemoryReservationStore};
use hotel_inventory_reservation::adapter::driver::response_dto::{
    InventoryResponse, OpenInventoryResponse, ReservationResponse,
};
use hotel_inventory_reservation::adapter::driver::rest_api::{create_router, ApiError, AppState};
use hotel_inventory_reservation::application::service::{
    InventoryApplicationService, InventoryCounterInitializer, ReservationApplicationService,
};
use hotel_inventory_reservation::domain::counter::InventoryCounter;
use hotel_inventory_reservation::domain::model::{
    InventoryDay, ReservationStatus, RoomType, RoomTypeId,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const ROOM_TYPE: RoomTypeId = RoomTypeId::new(1);

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, day).unwrap()
}

/// 8/1〜8/4 に2室ずつの在庫を持ち、本日が 2026-08-01 のインメモリ構成でテストサーバーを起動する
async fn setup() -> (TestServer, Arc<InMemoryReservationStore>) {
    let store = Arc::new(InMemoryReservationStore::new(Duration::from_secs(1)));
    store.add_room_type(RoomType::new(ROOM_TYPE, 1, "スタンダードダブル".to_string(), 2));
    for day in 1..=4 {
        store.add_inventory_day(InventoryDay::new(ROOM_TYPE, date(day), 2));
    }

    let counter = Arc::new(InventoryCounter::new());
    InventoryCounterInitializer::new(store.clone(), counter.clone())
        .run()
        .await
        .unwrap();

    let state = AppState {
        reservation_service: Arc::new(ReservationApplicationService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            counter.clone(),
            Arc::new(FixedClock::new(
                Utc.with_ymd_and_hms(2026, 8, 1, 9, 0, 0).unwrap(),
            )),
        )),
        inventory_service: Arc::new(InventoryApplicationService::new(
            store.clone(),
            store.clone(),
            counter,
            31,
        )),
    };

    let server = TestServer::new(create_router().with_state(state)).unwrap();
    (server, store)
}

fn reservation_body(check_in: &str, check_out: &str, rooms: u32) -> serde_json::Value {
    json!({
        "room_type_id": 1,
        "guest_name": "山田太郎",
        "guest_email": "taro@example.com",
        "check_in_date": check_in,
        "check_out_date": check_out,
        "number_of_rooms": rooms
    })
}

#[tokio::test]
async fn test_health_check() {
    let (server, _) = setup().await;

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_create_reservation_returns_created() {
    let (server, store) = setup().await;

    let response = server
        .post("/api/v1/reservations")
        .json(&reservation_body("2026-08-01", "2026-08-03", 1))
        .await;

    response.assert_status(StatusCode::CREATED);
    let reservation: ReservationResponse = response.json();
    assert_eq!(reservation.status, ReservationStatus::Confirmed);
    assert_eq!(reservation.room_type_name, "スタンダードダブル");
    assert_eq!(reservation.number_of_rooms, 1);
    assert_eq!(store.available_quantity(ROOM_TYPE, date(1)), Some(1));
    assert_eq!(store.available_quantity(ROOM_TYPE, date(2)), Some(1));
    assert_eq!(store.available_quantity(ROOM_TYPE, date(3)), Some(2));
}

#[tokio::test]
async fn test_get_reservation() {
    let (server, _) = setup().await;
    let created: ReservationResponse = server
        .post("/api/v1/reservations")
        .json(&reservation_body("2026-08-02", "2026-08-04", 2))
        .await
        .json();

    let response = server
        .get(&format!("/api/v1/reservations/{}", created.reservation_id))
        .await;

    response.assert_status_ok();
    let fetched: ReservationResponse = response.json();
    assert_eq!(fetched.reservation_id, created.reservation_id);
    assert_eq!(fetched.guest_email, "taro@example.com");
    assert_eq!(fetched.check_in_date, date(2));
    assert_eq!(fetched.check_out_date, date(4));
}

#[tokio::test]
async fn test_get_unknown_reservation_returns_not_found() {
    let (server, _) = setup().await;

    let response = server.get("/api/v1/reservations/999").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let error: ApiError = response.json();
    assert_eq!(error.code, "NOT_FOUND");
}

#[tokio::test]
async fn test_get_reservation_with_malformed_id() {
    let (server, _) = setup().await;

    let response = server.get("/api/v1/reservations/abc").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error: ApiError = response.json();
    assert_eq!(error.code, "INVALID_REQUEST");
}

#[tokio::test]
async fn test_cancel_reservation_restores_inventory() {
    let (server, store) = setup().await;
    let created: ReservationResponse = server
        .post("/api/v1/reservations")
        .json(&reservation_body("2026-08-01", "2026-08-03", 2))
        .await
        .json();
    assert_eq!(store.available_quantity(ROOM_TYPE, date(1)), Some(0));

    let response = server
        .patch(&format!(
            "/api/v1/reservations/{}/cancel",
            created.reservation_id
        ))
        .await;

    response.assert_status_ok();
    let cancelled: ReservationResponse = response.json();
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);
    assert_eq!(store.available_quantity(ROOM_TYPE, date(1)), Some(2));
    assert_eq!(store.available_quantity(ROOM_TYPE, date(2)), Some(2));
}

#[tokio::test]
async fn test_cancel_twice_returns_conflict() {
    let (server, store) = setup().await;
    let created: ReservationResponse = server
        .post("/api/v1/reservations")
        .json(&reservation_body("2026-08-01", "2026-08-02", 1))
        .await
        .json();
    let path = format!("/api/v1/reservations/{}/cancel", created.reservation_id);
    server.patch(&path).await.assert_status_ok();

    let response = server.patch(&path).await;

    response.assert_status(StatusCode::CONFLICT);
    let error: ApiError = response.json();
    assert_eq!(error.code, "INVALID_RESERVATION_STATE");
    assert_eq!(store.available_quantity(ROOM_TYPE, date(1)), Some(2));
}

#[tokio::test]
async fn test_insufficient_inventory_returns_conflict() {
    let (server, store) = setup().await;

    let response = server
        .post("/api/v1/reservations")
        .json(&reservation_body("2026-08-01", "2026-08-03", 3))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let error: ApiError = response.json();
    assert_eq!(error.code, "INSUFFICIENT_INVENTORY");
    assert!(store.reservations().is_empty());
    assert_eq!(store.available_quantity(ROOM_TYPE, date(1)), Some(2));
}

#[tokio::test]
async fn test_reversed_stay_period_returns_validation_error() {
    let (server, _) = setup().await;

    let response = server
        .post("/api/v1/reservations")
        .json(&reservation_body("2026-08-03", "2026-08-01", 1))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error: ApiError = response.json();
    assert_eq!(error.code, "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_past_check_in_returns_validation_error() {
    let (server, store) = setup().await;
    store.add_inventory_day(InventoryDay::new(
        ROOM_TYPE,
        NaiveDate::from_ymd_opt(2026, 7, 31).unwrap(),
        2,
    ));

    let response = server
        .post("/api/v1/reservations")
        .json(&reservation_body("2026-07-31", "2026-08-02", 1))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error: ApiError = response.json();
    assert_eq!(error.code, "VALIDATION_ERROR");
    assert!(store.reservations().is_empty());
    assert_eq!(store.available_quantity(ROOM_TYPE, date(1)), Some(2));
}

#[tokio::test]
async fn test_stay_longer_than_a_year_returns_validation_error() {
    let (server, store) = setup().await;

    let response = server
        .post("/api/v1/reservations")
        .json(&reservation_body("2026-08-01", "2027-08-02", 1))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error: ApiError = response.json();
    assert_eq!(error.code, "VALIDATION_ERROR");
    assert_eq!(store.transactions_started(), 0);
}

#[tokio::test]
async fn test_malformed_body_returns_bad_request() {
    let (server, _) = setup().await;

    let response = server
        .post("/api/v1/reservations")
        .json(&json!({ "room_type_id": 1, "check_in_date": "not-a-date" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error: ApiError = response.json();
    assert_eq!(error.code, "INVALID_REQUEST");
}

#[tokio::test]
async fn test_get_availability() {
    let (server, _) = setup().await;
    server
        .post("/api/v1/reservations")
        .json(&reservation_body("2026-08-02", "2026-08-03", 1))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .get("/api/v1/inventory")
        .add_query_param("room_type_id", 1)
        .add_query_param("check_in_date", "2026-08-01")
        .add_query_param("check_out_date", "2026-08-04")
        .await;

    response.assert_status_ok();
    let inventory: InventoryResponse = response.json();
    let available: Vec<u32> = inventory
        .daily_availabilities
        .iter()
        .map(|d| d.available_quantity)
        .collect();
    assert_eq!(available, vec![2, 1, 2]);
}

#[tokio::test]
async fn test_get_availability_without_params_returns_bad_request() {
    let (server, _) = setup().await;

    let response = server.get("/api/v1/inventory").await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_open_inventory_then_reserve_new_dates() {
    let (server, store) = setup().await;

    let response = server
        .post("/api/v1/inventory")
        .json(&json!({
            "room_type_id": 1,
            "from_date": "2026-08-04",
            "to_date": "2026-08-07",
            "total_quantity": 6
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let opened: OpenInventoryResponse = response.json();
    let dates: Vec<NaiveDate> = opened.created.iter().map(|d| d.date).collect();
    assert_eq!(dates, vec![date(5), date(6)]);
    assert_eq!(store.available_quantity(ROOM_TYPE, date(4)), Some(2));

    server
        .post("/api/v1/reservations")
        .json(&reservation_body("2026-08-05", "2026-08-07", 6))
        .await
        .assert_status(StatusCode::CREATED);
    assert_eq!(store.available_quantity(ROOM_TYPE, date(6)), Some(0));
}

#[tokio::test]
async fn test_open_inventory_range_over_limit_returns_validation_error() {
    let (server, store) = setup().await;

    let response = server
        .post("/api/v1/inventory")
        .json(&json!({
            "room_type_id": 1,
            "from_date": "2026-09-01",
            "to_date": "2036-09-01",
            "total_quantity": 1
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error: ApiError = response.json();
    assert_eq!(error.code, "VALIDATION_ERROR");
    assert_eq!(
        store.available_quantity(ROOM_TYPE, NaiveDate::from_ymd_opt(2026, 9, 1).unwrap()),
        None
    );
}

#[tokio::test]
async fn test_open_inventory_for_unknown_room_type() {
    let (server, _) = setup().await;

    let response = server
        .post("/api/v1/inventory")
        .json(&json!({
            "room_type_id": 42,
            "from_date": "2026-08-01",
            "to_date": "2026-08-02",
            "total_quantity": 1
        }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}
