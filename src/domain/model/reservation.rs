use crate::domain::error::DomainError;
use crate::domain::model::{Guest, ReservationId, ReservationStatus, RoomType, StayPeriod};
use chrono::{DateTime, Utc};

/// 台帳に追加される前の予約
/// 在庫の減算と同じトランザクションで CONFIRMED として作成される
#[derive(Debug, Clone, PartialEq)]
pub struct NewReservation {
    room_type: RoomType,
    guest: Guest,
    stay: StayPeriod,
    number_of_rooms: u32,
    created_at: DateTime<Utc>,
}

impl NewReservation {
    /// 確定予約を作成
    ///
    /// # Returns
    /// * `Ok(NewReservation)` - 作成成功
    /// * `Err(DomainError::InvalidQuantity)` - 客室数が0
    pub fn confirmed(
        room_type: RoomType,
        guest: Guest,
        stay: StayPeriod,
        number_of_rooms: u32,
    ) -> Result<Self, DomainError> {
        if number_of_rooms == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        Ok(Self {
            room_type,
            guest,
            stay,
            number_of_rooms,
            created_at: Utc::now(),
        })
    }

    pub fn room_type(&self) -> &RoomType {
        &self.room_type
    }

    pub fn guest(&self) -> &Guest {
        &self.guest
    }

    pub fn stay(&self) -> StayPeriod {
        self.stay
    }

    pub fn number_of_rooms(&self) -> u32 {
        self.number_of_rooms
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// 採番されたIDを付与して予約にする
    pub fn into_reservation(self, id: ReservationId) -> Reservation {
        Reservation {
            id,
            room_type: self.room_type,
            guest: self.guest,
            stay: self.stay,
            number_of_rooms: self.number_of_rooms,
            status: ReservationStatus::Confirmed,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// 予約
/// ライフサイクル: CONFIRMED → CANCELLED（一方向のみ）
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    id: ReservationId,
    room_type: RoomType,
    guest: Guest,
    stay: StayPeriod,
    number_of_rooms: u32,
    status: ReservationStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Reservation {
    /// 永続化された値から予約を再構築する
    #[allow(clippy::too_many_arguments)]
    pub fn reconstruct(
        id: ReservationId,
        room_type: RoomType,
        guest: Guest,
        stay: StayPeriod,
        number_of_rooms: u32,
        status: ReservationStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if number_of_rooms == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        Ok(Self {
            id,
            room_type,
            guest,
            stay,
            number_of_rooms,
            status,
            created_at,
            updated_at,
        })
    }

    pub fn id(&self) -> ReservationId {
        self.id
    }

    pub fn room_type(&self) -> &RoomType {
        &self.room_type
    }

    pub fn guest(&self) -> &Guest {
        &self.guest
    }

    pub fn stay(&self) -> StayPeriod {
        self.stay
    }

    pub fn number_of_rooms(&self) -> u32 {
        self.number_of_rooms
    }

    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// 取消可能かチェック
    ///
    /// # Returns
    /// * `Ok(())` - CONFIRMED 状態
    /// * `Err(DomainError::InvalidReservationState)` - それ以外
    pub fn ensure_cancellable(&self) -> Result<(), DomainError> {
        if self.status != ReservationStatus::Confirmed {
            return Err(DomainError::InvalidReservationState {
                reservation_id: self.id,
                status: self.status,
            });
        }
        Ok(())
    }

    /// 予約を取り消す
    /// 取消済みの予約を再度取り消すことはできない（no-opではなくエラー）
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        self.ensure_cancellable()?;
        self.status = ReservationStatus::Cancelled;
        self.updated_at = Utc::now();
        Ok(())
    }
}
