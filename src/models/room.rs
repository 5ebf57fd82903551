use serde::{Deserialize, Serialize};

/// The unit customers browse and reserve against. Individual rooms are an
/// inventory detail; availability is always reported per room type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomType {
    pub id: i64,
    pub hotel_id: i64,
    pub name: String,
    pub base_price: f64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub hotel_id: i64,
    pub room_type_id: i64,
    pub room_number: String,
    pub is_active: bool,
}
