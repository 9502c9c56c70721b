use crate::domain::model::RoomTypeId;

/// 客室タイプ
/// ホテル内の客室の種類（デラックス、スイートなど）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomType {
    id: RoomTypeId,
    hotel_id: i64,
    name: String,
    max_occupancy: u32,
}

impl RoomType {
    pub fn new(id: RoomTypeId, hotel_id: i64, name: String, max_occupancy: u32) -> Self {
        Self {
            id,
            hotel_id,
            name,
            max_occupancy,
        }
    }

    pub fn id(&self) -> RoomTypeId {
        self.id
    }

    pub fn hotel_id(&self) -> i64 {
        self.hotel_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_occupancy(&self) -> u32 {
        self.max_occupancy
    }
}
