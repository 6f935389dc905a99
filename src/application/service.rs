use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::domain::{FareCalculator, ParkingSpot, Ticket, VehicleType};
use crate::storage::{ParkingStore, Repository};

use super::{InputReader, ParkingError};

/// Entry and exit workflows of the garage.
///
/// Generic over the store so the workflows run the same against SQLite or an
/// in-memory fake, and over the input so answers can come from a terminal or
/// from command-line arguments.
pub struct ParkingService<S, I> {
    store: S,
    input: I,
    fares: FareCalculator,
}

/// Result of a vehicle entering the garage
#[derive(Debug, Clone)]
pub struct EntryReceipt {
    pub ticket: Ticket,
    /// The vehicle already has closed tickets and will get the discount on exit
    pub recurring: bool,
}

/// Result of a vehicle leaving the garage
#[derive(Debug, Clone)]
pub struct ExitReceipt {
    pub ticket: Ticket,
    pub discounted: bool,
}

impl<S: ParkingStore, I: InputReader> ParkingService<S, I> {
    pub fn new(store: S, input: I, fares: FareCalculator) -> Self {
        Self {
            store,
            input,
            fares,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn fares(&self) -> &FareCalculator {
        &self.fares
    }

    /// Ask for the vehicle type and find the lowest free spot for it.
    /// The returned spot is still marked available; nothing is persisted.
    pub async fn get_next_parking_number_if_available(
        &mut self,
    ) -> Result<ParkingSpot, ParkingError> {
        let vehicle_type = self.read_vehicle_type()?;

        match self.store.get_next_available_slot(vehicle_type).await? {
            Some(id) => Ok(ParkingSpot::new(id, vehicle_type, true)),
            None => {
                warn!(%vehicle_type, "no spot available");
                Err(ParkingError::NoSpotAvailable(vehicle_type))
            }
        }
    }

    /// Park an entering vehicle: occupy a spot and open a ticket at `now`.
    pub async fn process_incoming_vehicle(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<EntryReceipt, ParkingError> {
        let mut spot = self.get_next_parking_number_if_available().await?;
        let vehicle_reg_number = self.input.read_vehicle_registration_number()?;

        if let Some(current) = self.store.get_ticket(&vehicle_reg_number).await? {
            if current.is_open() {
                warn!(vehicle = %vehicle_reg_number, spot = current.spot.id, "vehicle already parked");
                return Err(ParkingError::VehicleAlreadyParked {
                    vehicle_reg_number,
                    spot_id: current.spot.id,
                });
            }
        }

        let recurring = self.is_recurring(&vehicle_reg_number).await?;

        spot.occupy();
        if !self.store.update_parking(&spot).await? {
            warn!(spot = spot.id, "unable to occupy spot");
            return Err(ParkingError::SpotNotUpdated(spot.id));
        }

        let ticket = Ticket::new(spot, vehicle_reg_number, now);
        let saved = match self.store.save_ticket(&ticket).await {
            Ok(saved) => saved,
            Err(e) => {
                self.free_spot_without_ticket(&ticket).await;
                return Err(e.into());
            }
        };
        if !saved {
            self.free_spot_without_ticket(&ticket).await;
            return Err(ParkingError::TicketNotSaved(ticket.vehicle_reg_number));
        }

        info!(
            vehicle = %ticket.vehicle_reg_number,
            spot = ticket.spot.id,
            recurring,
            "vehicle parked"
        );
        Ok(EntryReceipt { ticket, recurring })
    }

    /// Close the ticket of an exiting vehicle at `now`, price it and free its spot.
    ///
    /// The spot is released only once the closed ticket is stored; if storing
    /// the ticket fails the spot stays occupied.
    pub async fn process_exiting_vehicle(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<ExitReceipt, ParkingError> {
        let vehicle_reg_number = self.input.read_vehicle_registration_number()?;

        let mut ticket = match self.store.get_ticket(&vehicle_reg_number).await? {
            Some(ticket) if ticket.is_open() => ticket,
            _ => {
                warn!(vehicle = %vehicle_reg_number, "no open ticket");
                return Err(ParkingError::TicketNotFound(vehicle_reg_number));
            }
        };

        // Still open in the store, so it is not among the closed tickets
        let discounted = self.is_recurring(&vehicle_reg_number).await?;
        let price = self.fares.calculate_fare(
            ticket.in_time,
            Some(now),
            ticket.spot.vehicle_type,
            discounted,
        )?;
        ticket.close(now, price);

        match self.store.update_ticket(&ticket).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(ticket = %ticket.id, spot = ticket.spot.id, "unable to close ticket");
                return Err(ParkingError::TicketNotUpdated {
                    ticket_id: ticket.id,
                    spot_id: ticket.spot.id,
                });
            }
            Err(e) => {
                warn!(ticket = %ticket.id, spot = ticket.spot.id, error = %e, "unable to close ticket");
                return Err(ParkingError::TicketNotUpdated {
                    ticket_id: ticket.id,
                    spot_id: ticket.spot.id,
                });
            }
        }

        ticket.spot.release();
        if !self.store.update_parking(&ticket.spot).await? {
            warn!(ticket = %ticket.id, spot = ticket.spot.id, "unable to release spot");
            return Err(ParkingError::SpotNotReleased {
                ticket_id: ticket.id,
                spot_id: ticket.spot.id,
            });
        }

        info!(
            vehicle = %ticket.vehicle_reg_number,
            spot = ticket.spot.id,
            price = ticket.price,
            discounted,
            "vehicle exited"
        );
        Ok(ExitReceipt { ticket, discounted })
    }

    fn read_vehicle_type(&mut self) -> Result<VehicleType, ParkingError> {
        let selection = self.input.read_selection()?;
        VehicleType::from_selection(selection).ok_or_else(|| {
            warn!(selection, "unsupported vehicle type selected");
            ParkingError::UnsupportedVehicleType(selection.to_string())
        })
    }

    /// A vehicle is recurring once it has at least one closed ticket.
    async fn is_recurring(&self, vehicle_reg_number: &str) -> Result<bool, ParkingError> {
        Ok(self.store.count_closed_tickets(vehicle_reg_number).await? >= 1)
    }

    /// Undo the spot occupation of an entry whose ticket could not be stored.
    async fn free_spot_without_ticket(&self, ticket: &Ticket) {
        let mut spot = ticket.spot.clone();
        spot.release();
        match self.store.update_parking(&spot).await {
            Ok(true) => {}
            Ok(false) => warn!(spot = spot.id, "spot left occupied without a ticket"),
            Err(e) => warn!(spot = spot.id, error = %e, "spot left occupied without a ticket"),
        }
    }
}

impl<I: InputReader> ParkingService<Repository, I> {
    /// Open the database at the given path, creating and seeding it if needed.
    pub async fn init(database_path: &str, input: I, fares: FareCalculator) -> Result<Self, ParkingError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo, input, fares))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str, input: I, fares: FareCalculator) -> Result<Self, ParkingError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo, input, fares))
    }

    /// Every spot with its availability.
    pub async fn spots(&self) -> Result<Vec<ParkingSpot>, ParkingError> {
        Ok(self.store.list_spots().await?)
    }

    /// Every ticket of a vehicle, newest first.
    pub async fn history(&self, vehicle_reg_number: &str) -> Result<Vec<Ticket>, ParkingError> {
        Ok(self.store.list_tickets(vehicle_reg_number).await?)
    }

    /// Free all spots and delete all tickets.
    pub async fn reset(&self) -> Result<(), ParkingError> {
        self.store.clear_entries().await?;
        warn!("all tickets deleted and spots freed");
        Ok(())
    }
}
