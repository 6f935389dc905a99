use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{ParkingSpot, SpotId, Ticket, VehicleType};

/// Persistence capability the parking workflows depend on.
///
/// Update and save methods report `Ok(false)` when no record was affected;
/// `Err` is reserved for the store itself failing.
#[async_trait]
pub trait ParkingStore: Send + Sync {
    /// Lowest-numbered free spot for the vehicle type, or `None` when the
    /// garage is full for that type.
    async fn get_next_available_slot(&self, vehicle_type: VehicleType) -> Result<Option<SpotId>>;

    /// Persist the availability of a spot.
    async fn update_parking(&self, spot: &ParkingSpot) -> Result<bool>;

    /// Insert a new ticket.
    async fn save_ticket(&self, ticket: &Ticket) -> Result<bool>;

    /// Latest ticket issued to a vehicle, open or closed.
    async fn get_ticket(&self, vehicle_reg_number: &str) -> Result<Option<Ticket>>;

    /// Persist the exit time and price of a ticket.
    async fn update_ticket(&self, ticket: &Ticket) -> Result<bool>;

    /// Number of tickets ever issued to a vehicle.
    async fn get_nb_ticket(&self, vehicle_reg_number: &str) -> Result<i64>;

    /// Number of closed tickets for a vehicle.
    async fn count_closed_tickets(&self, vehicle_reg_number: &str) -> Result<i64>;
}
