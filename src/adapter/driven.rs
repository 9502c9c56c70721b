// 駆動される側アダプター（リポジトリ・在庫ストア実装）

mod clock;
mod in_memory_store;
mod inventory_repository;
mod reservation_repository;
mod reservation_store;
mod room_type_repository;

pub use clock::{FixedClock, SystemClock};
pub use in_memory_store::{InMemoryReservationStore, InMemoryReservationTransaction};
pub use inventory_repository::MySqlInventoryRepository;
pub use reservation_repository::MySqlReservationRepository;
pub use reservation_store::{MySqlReservationStore, MySqlReservationTransaction};
pub use room_type_repository::MySqlRoomTypeRepository;
