use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

fn default_number_of_rooms() -> u32 {
    1
}

/// 予約作成用のリクエストDTO
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateReservationRequest {
    pub room_type_id: i64,
    pub guest_name: String,
    pub guest_email: String,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    /// 省略時は1室
    #[serde(default = "default_number_of_rooms")]
    pub number_of_rooms: u32,
}

/// 空室照会用のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct AvailabilityQueryParams {
    pub room_type_id: i64,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
}

/// 日別在庫登録用のリクエストDTO
/// `[from_date, to_date)` の各日に `total_quantity` 室を用意する
#[derive(Debug, Serialize, Deserialize)]
pub struct OpenInventoryRequest {
    pub room_type_id: i64,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub total_quantity: u32,
}
