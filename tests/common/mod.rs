// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::Mutex;

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parkit::application::{FixedInput, ParkingService};
use parkit::domain::{FareCalculator, FareConfig, ParkingSpot, SpotId, Ticket, VehicleType};
use parkit::storage::{ParkingStore, Repository};
use tempfile::TempDir;

pub const VEHICLE_REG_NUMBER: &str = "ABCDEF";

/// Helper to create a SQLite-backed service in a temporary directory
pub async fn test_service(input: FixedInput) -> Result<(ParkingService<Repository, FixedInput>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = ParkingService::init(
        db_path.to_str().unwrap(),
        input,
        FareCalculator::new(FareConfig::default()),
    )
    .await?;
    Ok((service, temp_dir))
}

/// Helper to parse an RFC 3339 timestamp into DateTime<Utc>
pub fn parse_time(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value).unwrap().with_timezone(&Utc)
}

/// Number of calls made to each store method
#[derive(Debug, Clone, Default)]
pub struct Calls {
    pub get_next_available_slot: usize,
    pub update_parking: usize,
    pub save_ticket: usize,
    pub get_ticket: usize,
    pub update_ticket: usize,
    pub get_nb_ticket: usize,
    pub count_closed_tickets: usize,
}

impl Calls {
    pub fn total(&self) -> usize {
        self.get_next_available_slot
            + self.update_parking
            + self.save_ticket
            + self.get_ticket
            + self.update_ticket
            + self.get_nb_ticket
            + self.count_closed_tickets
    }
}

#[derive(Default)]
struct StoreState {
    spots: Vec<ParkingSpot>,
    tickets: Vec<Ticket>,
    calls: Calls,
    reject_ticket_updates: bool,
    fail_ticket_updates: bool,
    reject_ticket_saves: bool,
    reject_spot_updates: bool,
}

/// In-memory store that records every call and can be told to reject writes.
#[derive(Default)]
pub struct RecordingStore {
    state: Mutex<StoreState>,
}

impl RecordingStore {
    /// Spots 1-3 for cars and 4-5 for bikes, all free
    pub fn garage() -> Self {
        Self::with_spots(vec![
            ParkingSpot::new(1, VehicleType::Car, true),
            ParkingSpot::new(2, VehicleType::Car, true),
            ParkingSpot::new(3, VehicleType::Car, true),
            ParkingSpot::new(4, VehicleType::Bike, true),
            ParkingSpot::new(5, VehicleType::Bike, true),
        ])
    }

    pub fn with_spots(spots: Vec<ParkingSpot>) -> Self {
        Self {
            state: Mutex::new(StoreState {
                spots,
                ..Default::default()
            }),
        }
    }

    pub fn rejecting_ticket_updates(self) -> Self {
        self.state.lock().unwrap().reject_ticket_updates = true;
        self
    }

    /// Make `update_ticket` return a store error instead of `Ok(false)`
    pub fn failing_ticket_updates(self) -> Self {
        self.state.lock().unwrap().fail_ticket_updates = true;
        self
    }

    pub fn rejecting_ticket_saves(self) -> Self {
        self.state.lock().unwrap().reject_ticket_saves = true;
        self
    }

    pub fn rejecting_spot_updates(self) -> Self {
        self.state.lock().unwrap().reject_spot_updates = true;
        self
    }

    /// Store a ticket directly, bypassing the workflows
    pub fn insert_ticket(&self, ticket: Ticket) {
        self.state.lock().unwrap().tickets.push(ticket);
    }

    pub fn calls(&self) -> Calls {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn spot(&self, id: SpotId) -> Option<ParkingSpot> {
        let state = self.state.lock().unwrap();
        state.spots.iter().find(|s| s.id == id).cloned()
    }

    pub fn tickets(&self) -> Vec<Ticket> {
        self.state.lock().unwrap().tickets.clone()
    }
}

#[async_trait]
impl ParkingStore for RecordingStore {
    async fn get_next_available_slot(&self, vehicle_type: VehicleType) -> Result<Option<SpotId>> {
        let mut state = self.state.lock().unwrap();
        state.calls.get_next_available_slot += 1;
        Ok(state
            .spots
            .iter()
            .filter(|s| s.vehicle_type == vehicle_type && s.is_available)
            .map(|s| s.id)
            .min())
    }

    async fn update_parking(&self, spot: &ParkingSpot) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.calls.update_parking += 1;
        if state.reject_spot_updates {
            return Ok(false);
        }
        match state.spots.iter_mut().find(|s| s.id == spot.id) {
            Some(stored) => {
                stored.is_available = spot.is_available;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn save_ticket(&self, ticket: &Ticket) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.calls.save_ticket += 1;
        if state.reject_ticket_saves {
            return Ok(false);
        }
        state.tickets.push(ticket.clone());
        Ok(true)
    }

    async fn get_ticket(&self, vehicle_reg_number: &str) -> Result<Option<Ticket>> {
        let mut state = self.state.lock().unwrap();
        state.calls.get_ticket += 1;
        // Latest by entry time; on ties the last inserted wins
        Ok(state
            .tickets
            .iter()
            .filter(|t| t.vehicle_reg_number == vehicle_reg_number)
            .fold(None::<&Ticket>, |latest, t| match latest {
                Some(l) if l.in_time > t.in_time => Some(l),
                _ => Some(t),
            })
            .cloned())
    }

    async fn update_ticket(&self, ticket: &Ticket) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.calls.update_ticket += 1;
        if state.fail_ticket_updates {
            bail!("database is locked");
        }
        if state.reject_ticket_updates {
            return Ok(false);
        }
        match state
            .tickets
            .iter_mut()
            .find(|t| t.id == ticket.id && t.is_open())
        {
            Some(stored) => {
                stored.out_time = ticket.out_time;
                stored.price = ticket.price;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_nb_ticket(&self, vehicle_reg_number: &str) -> Result<i64> {
        let mut state = self.state.lock().unwrap();
        state.calls.get_nb_ticket += 1;
        Ok(state
            .tickets
            .iter()
            .filter(|t| t.vehicle_reg_number == vehicle_reg_number)
            .count() as i64)
    }

    async fn count_closed_tickets(&self, vehicle_reg_number: &str) -> Result<i64> {
        let mut state = self.state.lock().unwrap();
        state.calls.count_closed_tickets += 1;
        Ok(state
            .tickets
            .iter()
            .filter(|t| t.vehicle_reg_number == vehicle_reg_number && !t.is_open())
            .count() as i64)
    }
}

/// Service over an in-memory store with the default tariff
pub fn fake_service(store: RecordingStore, input: FixedInput) -> ParkingService<RecordingStore, FixedInput> {
    ParkingService::new(store, input, FareCalculator::new(FareConfig::default()))
}
