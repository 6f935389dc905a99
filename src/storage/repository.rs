use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::domain::{ParkingSpot, SpotId, Ticket, VehicleType};

use super::{MIGRATION_001_INITIAL, ParkingStore};

const TICKET_COLUMNS: &str = r#"
    t.id, t.parking_number, t.vehicle_reg_number, t.price_cents, t.in_time, t.out_time,
    p.vehicle_type, p.available
"#;

/// SQLite-backed store for parking spots and tickets.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Create the tables and seed the garage layout. Safe to run repeatedly.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Free every spot and delete all tickets.
    pub async fn clear_entries(&self) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to start transaction")?;

        sqlx::query("UPDATE parking SET available = 1")
            .execute(&mut *tx)
            .await
            .context("Failed to free parking spots")?;
        sqlx::query("DELETE FROM tickets")
            .execute(&mut *tx)
            .await
            .context("Failed to delete tickets")?;

        tx.commit().await.context("Failed to commit reset")?;
        Ok(())
    }

    // ========================
    // Spot queries
    // ========================

    /// Get a spot by number.
    pub async fn get_spot(&self, id: SpotId) -> Result<Option<ParkingSpot>> {
        let row = sqlx::query(
            "SELECT parking_number, vehicle_type, available FROM parking WHERE parking_number = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch parking spot")?;

        row.as_ref().map(Self::row_to_spot).transpose()
    }

    /// List every spot in the garage, ordered by number.
    pub async fn list_spots(&self) -> Result<Vec<ParkingSpot>> {
        let rows = sqlx::query(
            "SELECT parking_number, vehicle_type, available FROM parking ORDER BY parking_number",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list parking spots")?;

        rows.iter().map(Self::row_to_spot).collect()
    }

    // ========================
    // Ticket queries
    // ========================

    /// List every ticket of a vehicle, newest first.
    pub async fn list_tickets(&self, vehicle_reg_number: &str) -> Result<Vec<Ticket>> {
        let query = format!(
            r#"
            SELECT {TICKET_COLUMNS}
            FROM tickets t
            JOIN parking p ON p.parking_number = t.parking_number
            WHERE t.vehicle_reg_number = ?
            ORDER BY t.in_time DESC, t.rowid DESC
            "#
        );

        let rows = sqlx::query(&query)
            .bind(vehicle_reg_number)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list tickets")?;

        rows.iter().map(Self::row_to_ticket).collect()
    }

    fn row_to_spot(row: &sqlx::sqlite::SqliteRow) -> Result<ParkingSpot> {
        let vehicle_type_str: String = row.get("vehicle_type");

        Ok(ParkingSpot {
            id: row.get("parking_number"),
            vehicle_type: VehicleType::from_str(&vehicle_type_str)
                .ok_or_else(|| anyhow::anyhow!("Unsupported vehicle type: {}", vehicle_type_str))?,
            is_available: row.get::<i32, _>("available") != 0,
        })
    }

    fn row_to_ticket(row: &sqlx::sqlite::SqliteRow) -> Result<Ticket> {
        let id_str: String = row.get("id");
        let in_time_str: String = row.get("in_time");
        let out_time_str: Option<String> = row.get("out_time");

        Ok(Ticket {
            id: Uuid::parse_str(&id_str).context("Invalid ticket ID")?,
            spot: Self::row_to_spot(row)?,
            vehicle_reg_number: row.get("vehicle_reg_number"),
            price: row.get("price_cents"),
            in_time: decode_time(&in_time_str).context("Invalid in_time timestamp")?,
            out_time: out_time_str
                .as_deref()
                .map(decode_time)
                .transpose()
                .context("Invalid out_time timestamp")?,
        })
    }
}

#[async_trait]
impl ParkingStore for Repository {
    async fn get_next_available_slot(&self, vehicle_type: VehicleType) -> Result<Option<SpotId>> {
        let row = sqlx::query(
            r#"
            SELECT MIN(parking_number) AS parking_number
            FROM parking
            WHERE vehicle_type = ? AND available = 1
            "#,
        )
        .bind(vehicle_type.as_str())
        .fetch_one(&self.pool)
        .await
        .context("Failed to find next available spot")?;

        let spot: Option<SpotId> = row.get("parking_number");
        debug!(%vehicle_type, ?spot, "next available spot");
        Ok(spot)
    }

    async fn update_parking(&self, spot: &ParkingSpot) -> Result<bool> {
        let result = sqlx::query("UPDATE parking SET available = ? WHERE parking_number = ?")
            .bind(spot.is_available)
            .bind(spot.id)
            .execute(&self.pool)
            .await
            .context("Failed to update parking spot")?;

        debug!(spot = spot.id, available = spot.is_available, rows = result.rows_affected(), "updated spot");
        Ok(result.rows_affected() == 1)
    }

    async fn save_ticket(&self, ticket: &Ticket) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO tickets (id, parking_number, vehicle_reg_number, price_cents, in_time, out_time)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(ticket.id.to_string())
        .bind(ticket.spot.id)
        .bind(&ticket.vehicle_reg_number)
        .bind(ticket.price)
        .bind(encode_time(ticket.in_time))
        .bind(ticket.out_time.map(encode_time))
        .execute(&self.pool)
        .await
        .context("Failed to save ticket")?;

        debug!(ticket = %ticket.id, vehicle = %ticket.vehicle_reg_number, "saved ticket");
        Ok(result.rows_affected() == 1)
    }

    async fn get_ticket(&self, vehicle_reg_number: &str) -> Result<Option<Ticket>> {
        let query = format!(
            r#"
            SELECT {TICKET_COLUMNS}
            FROM tickets t
            JOIN parking p ON p.parking_number = t.parking_number
            WHERE t.vehicle_reg_number = ?
            ORDER BY t.in_time DESC, t.rowid DESC
            LIMIT 1
            "#
        );

        let row = sqlx::query(&query)
            .bind(vehicle_reg_number)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch ticket")?;

        row.as_ref().map(Self::row_to_ticket).transpose()
    }

    async fn update_ticket(&self, ticket: &Ticket) -> Result<bool> {
        // A closed ticket is never rewritten
        let result = sqlx::query(
            r#"
            UPDATE tickets
            SET price_cents = ?, out_time = ?
            WHERE id = ? AND out_time IS NULL
            "#,
        )
        .bind(ticket.price)
        .bind(ticket.out_time.map(encode_time))
        .bind(ticket.id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to update ticket")?;

        debug!(ticket = %ticket.id, rows = result.rows_affected(), "updated ticket");
        Ok(result.rows_affected() == 1)
    }

    async fn get_nb_ticket(&self, vehicle_reg_number: &str) -> Result<i64> {
        let count: i64 =
            sqlx::query("SELECT COUNT(*) AS count FROM tickets WHERE vehicle_reg_number = ?")
                .bind(vehicle_reg_number)
                .fetch_one(&self.pool)
                .await
                .context("Failed to count tickets")?
                .get("count");
        Ok(count)
    }

    async fn count_closed_tickets(&self, vehicle_reg_number: &str) -> Result<i64> {
        let count: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) AS count
            FROM tickets
            WHERE vehicle_reg_number = ? AND out_time IS NOT NULL
            "#,
        )
        .bind(vehicle_reg_number)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count closed tickets")?
        .get("count");
        Ok(count)
    }
}

/// Fixed-width RFC 3339 so that text ordering in SQL is chronological.
fn encode_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_time(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}
