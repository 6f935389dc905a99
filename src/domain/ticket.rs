use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, ParkingSpot};

pub type TicketId = Uuid;

/// A ticket records one parking session, from entry to exit.
/// It is open while `out_time` is unset and closed once the exit is priced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    /// Spot held by the vehicle for the whole session
    pub spot: ParkingSpot,
    pub vehicle_reg_number: String,
    /// Amount owed in cents; 0 until the ticket is closed
    pub price: Cents,
    pub in_time: DateTime<Utc>,
    pub out_time: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Open a new ticket for a vehicle entering at `in_time`.
    pub fn new(spot: ParkingSpot, vehicle_reg_number: impl Into<String>, in_time: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            spot,
            vehicle_reg_number: vehicle_reg_number.into(),
            price: 0,
            in_time,
            out_time: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.out_time.is_none()
    }

    /// Close the ticket with its exit time and computed price.
    /// The caller validates the interval through the fare calculator first.
    pub fn close(&mut self, out_time: DateTime<Utc>, price: Cents) {
        self.out_time = Some(out_time);
        self.price = price;
    }

    /// Length of the stay, once the ticket is closed.
    pub fn duration(&self) -> Option<Duration> {
        self.out_time.map(|out| out - self.in_time)
    }
}
