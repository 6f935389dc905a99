use anyhow::Result;
use std::io::Write;

use crate::domain::{ParkingSpot, Ticket, format_cents};

/// Output format for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Table,
    Json,
    Csv,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(ExportFormat::Table),
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }
}

/// Export tickets to CSV format
pub fn export_tickets_csv<W: Write>(tickets: &[Ticket], writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record([
        "id",
        "vehicle_reg_number",
        "spot",
        "vehicle_type",
        "in_time",
        "out_time",
        "price",
    ])?;

    for ticket in tickets {
        csv_writer.write_record([
            ticket.id.to_string(),
            ticket.vehicle_reg_number.clone(),
            ticket.spot.id.to_string(),
            ticket.spot.vehicle_type.as_str().to_string(),
            ticket.in_time.to_rfc3339(),
            ticket.out_time.map(|t| t.to_rfc3339()).unwrap_or_default(),
            format_cents(ticket.price),
        ])?;
    }

    csv_writer.flush()?;
    Ok(tickets.len())
}

/// Export tickets as a JSON array
pub fn export_tickets_json<W: Write>(tickets: &[Ticket], writer: W) -> Result<usize> {
    serde_json::to_writer_pretty(writer, tickets)?;
    Ok(tickets.len())
}

/// Export spots to CSV format
pub fn export_spots_csv<W: Write>(spots: &[ParkingSpot], writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(["spot", "vehicle_type", "available"])?;
    for spot in spots {
        csv_writer.write_record([
            spot.id.to_string(),
            spot.vehicle_type.as_str().to_string(),
            spot.is_available.to_string(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(spots.len())
}

/// Export spots as a JSON array
pub fn export_spots_json<W: Write>(spots: &[ParkingSpot], writer: W) -> Result<usize> {
    serde_json::to_writer_pretty(writer, spots)?;
    Ok(spots.len())
}
