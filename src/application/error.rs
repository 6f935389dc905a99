use thiserror::Error;
use uuid::Uuid;

use crate::domain::{FareError, SpotId, VehicleType};

use super::InputError;

#[derive(Error, Debug)]
pub enum ParkingError {
    #[error("Unsupported vehicle type: {0}")]
    UnsupportedVehicleType(String),

    #[error("Invalid input: {0}")]
    Input(#[from] InputError),

    #[error("Unable to compute fare: {0}")]
    Fare(#[from] FareError),

    #[error("No {0} spot available, the parking is full")]
    NoSpotAvailable(VehicleType),

    #[error("No open ticket for vehicle {0}")]
    TicketNotFound(String),

    #[error("Vehicle {vehicle_reg_number} is already parked at spot {spot_id}")]
    VehicleAlreadyParked {
        vehicle_reg_number: String,
        spot_id: SpotId,
    },

    #[error("Unable to update parking spot {0}")]
    SpotNotUpdated(SpotId),

    #[error("Unable to save ticket for vehicle {0}")]
    TicketNotSaved(String),

    #[error("Unable to update ticket {ticket_id}, spot {spot_id} stays occupied")]
    TicketNotUpdated { ticket_id: Uuid, spot_id: SpotId },

    #[error("Ticket {ticket_id} is closed but spot {spot_id} could not be released")]
    SpotNotReleased { ticket_id: Uuid, spot_id: SpotId },

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl ParkingError {
    /// Bad operator input or an impossible time interval.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ParkingError::UnsupportedVehicleType(_) | ParkingError::Input(_) | ParkingError::Fare(_)
        )
    }

    /// Nothing to act on: no free spot, or no open ticket.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ParkingError::NoSpotAvailable(_) | ParkingError::TicketNotFound(_)
        )
    }
}
