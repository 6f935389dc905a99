use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write, stdout};

use crate::application::{
    ConsoleInput, EntryReceipt, ExitReceipt, FixedInput, InputError, ParkingError, ParkingService,
};
use crate::domain::{FareCalculator, FareConfig, ParkingSpot, Ticket, VehicleType, format_cents, parse_cents};
use crate::io::{
    ExportFormat, export_spots_csv, export_spots_json, export_tickets_csv, export_tickets_json,
};
use crate::storage::Repository;

/// Parkit - Parking Garage Manager
#[derive(Parser)]
#[command(name = "parkit")]
#[command(about = "Track parking spots, issue tickets and compute fares")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "parkit.db", env = "PARKIT_DATABASE", global = true)]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Hourly rate for cars (e.g., "1.50")
    #[arg(long, default_value = "1.50", env = "PARKIT_CAR_RATE", global = true)]
    pub car_rate: String,

    /// Hourly rate for bikes (e.g., "1.00")
    #[arg(long, default_value = "1.00", env = "PARKIT_BIKE_RATE", global = true)]
    pub bike_rate: String,

    /// Discount for recurring customers, in percent
    #[arg(long, default_value = "5", env = "PARKIT_DISCOUNT", global = true)]
    pub discount: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database with the garage layout
    Init,

    /// Free every spot and delete all tickets
    Reset,

    /// Register an entering vehicle
    Enter {
        /// Vehicle type: car, bike
        #[arg(short = 't', long = "type")]
        vehicle_type: String,

        /// Vehicle registration number
        #[arg(short, long)]
        reg: String,
    },

    /// Register an exiting vehicle and compute its fare
    Exit {
        /// Vehicle registration number
        #[arg(short, long)]
        reg: String,
    },

    /// Run the interactive operator menu
    Shell,

    /// List parking spots and their availability
    Spots {
        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Show the tickets of a vehicle
    History {
        /// Vehicle registration number
        reg: String,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
}

impl Cli {
    /// Build the tariff from the rate and discount options.
    pub fn fare_config(&self) -> Result<FareConfig> {
        let car_rate = parse_cents(&self.car_rate)
            .with_context(|| format!("Invalid car rate '{}'. Use '1.50' or '2'", self.car_rate))?;
        let bike_rate = parse_cents(&self.bike_rate)
            .with_context(|| format!("Invalid bike rate '{}'. Use '1.00' or '1'", self.bike_rate))?;

        Ok(FareConfig::new(car_rate, bike_rate, self.discount)?)
    }

    pub async fn run(self) -> Result<()> {
        let fares = FareCalculator::new(self.fare_config()?);

        match self.command {
            Commands::Init => {
                ParkingService::init(&self.database, FixedInput::default(), fares).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Reset => {
                let service =
                    ParkingService::connect(&self.database, FixedInput::default(), fares).await?;
                service.reset().await?;
                println!("All spots freed and tickets deleted");
            }

            Commands::Enter { vehicle_type, reg } => {
                let vt = VehicleType::from_str(&vehicle_type).ok_or_else(|| {
                    anyhow::anyhow!(
                        "Invalid vehicle type '{}'. Valid types: car, bike",
                        vehicle_type
                    )
                })?;
                let input = FixedInput::entering(vt.selection(), reg);
                let mut service = ParkingService::connect(&self.database, input, fares).await?;

                let receipt = service.process_incoming_vehicle(Utc::now()).await?;
                print_entry(&receipt, fares.config());
            }

            Commands::Exit { reg } => {
                let input = FixedInput::exiting(reg);
                let mut service = ParkingService::connect(&self.database, input, fares).await?;

                let receipt = service.process_exiting_vehicle(Utc::now()).await?;
                print_exit(&receipt);
            }

            Commands::Shell => {
                let mut service =
                    ParkingService::init(&self.database, ConsoleInput::stdin(), fares).await?;
                run_shell(&mut service).await?;
            }

            Commands::Spots { format } => {
                let service =
                    ParkingService::connect(&self.database, FixedInput::default(), fares).await?;
                let spots = service.spots().await?;
                run_spots_command(&spots, parse_format(&format)?)?;
            }

            Commands::History { reg, format } => {
                let service =
                    ParkingService::connect(&self.database, FixedInput::default(), fares).await?;
                let tickets = service.history(&reg).await?;
                run_history_command(&reg, &tickets, parse_format(&format)?)?;
            }
        }

        Ok(())
    }
}

/// Interactive menu loop. Workflow failures are reported and the loop goes on;
/// only losing the input stream ends it early.
async fn run_shell<R: BufRead>(service: &mut ParkingService<Repository, ConsoleInput<R>>) -> Result<()> {
    println!("Welcome to Parking System!");

    loop {
        println!("Please select an option. Simply enter the number to choose an action");
        println!("1 New Vehicle Entering - Allocate Parking Space");
        println!("2 Vehicle Exiting - Generate Ticket Price");
        println!("3 Shutdown System");
        stdout().flush()?;

        match service.input_mut().read_number() {
            Ok(1) => match service.process_incoming_vehicle(Utc::now()).await {
                Ok(receipt) => print_entry(&receipt, service.fares().config()),
                Err(e) => report_failure(&e),
            },
            Ok(2) => match service.process_exiting_vehicle(Utc::now()).await {
                Ok(receipt) => print_exit(&receipt),
                Err(e) => report_failure(&e),
            },
            Ok(3) => {
                println!("Exiting from the system!");
                break;
            }
            Ok(other) => println!("Unsupported option {}. Please enter a number from the menu", other),
            Err(InputError::Exhausted) => break,
            Err(e) => println!("{}", e),
        }
    }

    Ok(())
}

fn report_failure(error: &ParkingError) {
    if error.is_not_found() || error.is_validation() {
        println!("{}", error);
    } else {
        println!("Unable to process the vehicle: {}", error);
    }
}

fn print_entry(receipt: &EntryReceipt, fares: &FareConfig) {
    let ticket = &receipt.ticket;
    if receipt.recurring {
        println!(
            "Welcome back! As a recurring user of our parking lot, you'll benefit from a {}% discount.",
            fares.recurring_discount_percent
        );
    }
    println!("Generated Ticket and saved in DB");
    println!("Please park your vehicle in spot number: {}", ticket.spot.id);
    println!(
        "Recorded in-time for vehicle number: {} is: {}",
        ticket.vehicle_reg_number,
        ticket.in_time.format("%Y-%m-%d %H:%M:%S")
    );
}

fn print_exit(receipt: &ExitReceipt) {
    let ticket = &receipt.ticket;
    if receipt.discounted {
        println!("Recurring customer discount applied");
    }
    if let Some(duration) = ticket.duration() {
        println!(
            "Parking duration: {}h {:02}m",
            duration.num_hours(),
            duration.num_minutes() % 60
        );
    }
    println!("Please pay the parking fare: {}", format_cents(ticket.price));
    if let Some(out_time) = ticket.out_time {
        println!(
            "Recorded out-time for vehicle number: {} is: {}",
            ticket.vehicle_reg_number,
            out_time.format("%Y-%m-%d %H:%M:%S")
        );
    }
}

fn parse_format(format: &str) -> Result<ExportFormat> {
    ExportFormat::from_str(format).ok_or_else(|| {
        anyhow::anyhow!("Invalid format '{}'. Valid formats: table, json, csv", format)
    })
}

fn run_spots_command(spots: &[ParkingSpot], format: ExportFormat) -> Result<()> {
    match format {
        ExportFormat::Json => {
            export_spots_json(spots, stdout())?;
            println!();
        }
        ExportFormat::Csv => {
            export_spots_csv(spots, stdout())?;
        }
        ExportFormat::Table => {
            if spots.is_empty() {
                println!("No spots found. Run 'parkit init' first.");
                return Ok(());
            }
            println!("{:<6} {:<6} {:<10}", "SPOT", "TYPE", "STATUS");
            println!("{}", "-".repeat(24));
            for spot in spots {
                println!(
                    "{:<6} {:<6} {:<10}",
                    spot.id,
                    spot.vehicle_type,
                    if spot.is_available { "free" } else { "occupied" }
                );
            }
        }
    }
    Ok(())
}

fn run_history_command(reg: &str, tickets: &[Ticket], format: ExportFormat) -> Result<()> {
    match format {
        ExportFormat::Json => {
            export_tickets_json(tickets, stdout())?;
            println!();
        }
        ExportFormat::Csv => {
            export_tickets_csv(tickets, stdout())?;
        }
        ExportFormat::Table => {
            if tickets.is_empty() {
                println!("No tickets found for vehicle {}.", reg);
                return Ok(());
            }
            println!(
                "{:<6} {:<6} {:<20} {:<20} {:>8}",
                "SPOT", "TYPE", "IN", "OUT", "PRICE"
            );
            println!("{}", "-".repeat(64));
            for ticket in tickets {
                println!(
                    "{:<6} {:<6} {:<20} {:<20} {:>8}",
                    ticket.spot.id,
                    ticket.spot.vehicle_type,
                    ticket.in_time.to_rfc3339_opts(SecondsFormat::Secs, true),
                    ticket
                        .out_time
                        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
                        .unwrap_or_else(|| "(parked)".to_string()),
                    format_cents(ticket.price)
                );
            }
        }
    }
    Ok(())
}
