pub mod hotel;
pub mod inventory;
pub mod route;
pub mod search;

pub use hotel::{GeoLocation, Hotel, HotelInput, HotelPatch, Room, RoomInput, RoomType};
pub use inventory::InventoryError;
pub use route::{BusRoute, BusType, RouteInput, RoutePatch, SeatLayout, SeatState};
pub use search::{HotelFilter, RouteFilter};

use uuid::Uuid;

/// Catalog entries may be changed by their vendor or by any admin.
pub fn can_manage(owner: Option<Uuid>, actor: Uuid, actor_is_admin: bool) -> bool {
    actor_is_admin || owner == Some(actor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_manage() {
        let vendor = Uuid::new_v4();
        let other = Uuid::new_v4();
        assert!(can_manage(Some(vendor), vendor, false));
        assert!(!can_manage(Some(vendor), other, false));
        assert!(can_manage(Some(vendor), other, true));
        assert!(!can_manage(None, other, false));
    }
}
