use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Car,
    Bike,
}

impl VehicleType {
    pub const ALL: [VehicleType; 2] = [VehicleType::Car, VehicleType::Bike];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Car => "car",
            VehicleType::Bike => "bike",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "car" => Some(VehicleType::Car),
            "bike" => Some(VehicleType::Bike),
            _ => None,
        }
    }

    /// Map an operator menu choice to a vehicle type: 1 is a car, 2 a bike.
    pub fn from_selection(selection: u32) -> Option<Self> {
        match selection {
            1 => Some(VehicleType::Car),
            2 => Some(VehicleType::Bike),
            _ => None,
        }
    }

    /// The menu code `from_selection` accepts for this type.
    pub fn selection(&self) -> u32 {
        match self {
            VehicleType::Car => 1,
            VehicleType::Bike => 2,
        }
    }
}

impl std::fmt::Display for VehicleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
