use crate::application::service::RoomAvailability;
use crate::domain::model::{InventoryDay, Reservation, ReservationStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// 予約用のレスポンスDTO
#[derive(Debug, Serialize, Deserialize)]
pub struct ReservationResponse {
    pub reservation_id: i64,
    pub room_type_id: i64,
    pub room_type_name: String,
    pub guest_name: String,
    pub guest_email: String,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub number_of_rooms: u32,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 日別の空室数
#[derive(Debug, Serialize, Deserialize)]
pub struct DailyAvailabilityResponse {
    pub date: NaiveDate,
    pub total_quantity: u32,
    pub available_quantity: u32,
}

/// 空室照会用のレスポンスDTO
#[derive(Debug, Serialize, Deserialize)]
pub struct InventoryResponse {
    pub room_type_id: i64,
    pub room_type_name: String,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub daily_availabilities: Vec<DailyAvailabilityResponse>,
}

/// 日別在庫登録用のレスポンスDTO
#[derive(Debug, Serialize, Deserialize)]
pub struct OpenInventoryResponse {
    pub room_type_id: i64,
    /// 新たに作成された日付（既存の日付は含まない）
    pub created: Vec<DailyAvailabilityResponse>,
}

impl ReservationResponse {
    /// ドメインオブジェクトからReservationResponseを作成
    pub fn from_reservation(reservation: &Reservation) -> Self {
        let stay = reservation.stay();
        Self {
            reservation_id: reservation.id().value(),
            room_type_id: reservation.room_type().id().value(),
            room_type_name: reservation.room_type().name().to_string(),
            guest_name: reservation.guest().name().to_string(),
            guest_email: reservation.guest().email().to_string(),
            check_in_date: stay.check_in(),
            check_out_date: stay.check_out(),
            number_of_rooms: reservation.number_of_rooms(),
            status: reservation.status(),
            created_at: reservation.created_at(),
            updated_at: reservation.updated_at(),
        }
    }
}

impl DailyAvailabilityResponse {
    pub fn from_inventory_day(day: &InventoryDay) -> Self {
        Self {
            date: day.date(),
            total_quantity: day.total_quantity(),
            available_quantity: day.available_quantity(),
        }
    }
}

impl InventoryResponse {
    pub fn from_availability(availability: &RoomAvailability) -> Self {
        Self {
            room_type_id: availability.room_type.id().value(),
            room_type_name: availability.room_type.name().to_string(),
            check_in_date: availability.period.check_in(),
            check_out_date: availability.period.check_out(),
            daily_availabilities: availability
                .days
                .iter()
                .map(DailyAvailabilityResponse::from_inventory_day)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Guest, GuestId, NewReservation, ReservationId, RoomType, RoomTypeId, StayPeriod};

    #[test]
    fn test_reservation_response_from_reservation() {
        let reservation = NewReservation::confirmed(
            RoomType::new(RoomTypeId::new(1), 1, "スタンダードダブル".to_string(), 2),
            Guest::new(GuestId::new(7), "山田太郎".to_string(), "taro@example.com".to_string()),
            StayPeriod::new(
                NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(),
            )
            .unwrap(),
            2,
        )
        .unwrap()
        .into_reservation(ReservationId::new(42));

        let response = ReservationResponse::from_reservation(&reservation);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["reservation_id"], 42);
        assert_eq!(json["room_type_name"], "スタンダードダブル");
        assert_eq!(json["guest_email"], "taro@example.com");
        assert_eq!(json["check_in_date"], "2026-03-01");
        assert_eq!(json["number_of_rooms"], 2);
        assert_eq!(json["status"], "CONFIRMED");
    }

    #[test]
    fn test_inventory_response_lists_days_in_order() {
        let room_type_id = RoomTypeId::new(3);
        let first = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let second = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let availability = RoomAvailability {
            room_type: RoomType::new(room_type_id, 1, "スイート".to_string(), 4),
            period: StayPeriod::new(first, NaiveDate::from_ymd_opt(2026, 3, 3).unwrap()).unwrap(),
            days: vec![
                InventoryDay::new(room_type_id, first, 3),
                InventoryDay::reconstruct(room_type_id, second, 3, 1, 2).unwrap(),
            ],
        };

        let response = InventoryResponse::from_availability(&availability);

        assert_eq!(response.room_type_name, "スイート");
        assert_eq!(response.daily_availabilities.len(), 2);
        assert_eq!(response.daily_availabilities[1].date, second);
        assert_eq!(response.daily_availabilities[1].available_quantity, 1);
    }
}
