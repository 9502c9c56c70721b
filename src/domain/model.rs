// ドメインモデル（エンティティと値オブジェクト）

mod guest;
mod inventory_day;
mod reservation;
mod room_type;
mod value_objects;

pub use value_objects::{
    GuestId, GuestProfile,
    ReservationId, RoomTypeId,
    ReservationStatus,
    StayPeriod,
};

pub use guest::Guest;
pub use inventory_day::{InventoryDay, RestoreOutcome};
pub use reservation::{NewReservation, Reservation};
pub use room_type::RoomType;
