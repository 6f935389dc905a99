use serde::{Deserialize, Serialize};

use super::VehicleType;

/// Parking spot number, as painted on the ground.
pub type SpotId = i64;

/// A single parking space, scoped to one vehicle type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkingSpot {
    pub id: SpotId,
    pub vehicle_type: VehicleType,
    pub is_available: bool,
}

impl ParkingSpot {
    pub fn new(id: SpotId, vehicle_type: VehicleType, is_available: bool) -> Self {
        Self {
            id,
            vehicle_type,
            is_available,
        }
    }

    /// Mark the spot as taken by an entering vehicle.
    pub fn occupy(&mut self) {
        self.is_available = false;
    }

    /// Mark the spot as free after the vehicle left.
    pub fn release(&mut self) {
        self.is_available = true;
    }
}
