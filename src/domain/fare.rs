use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Cents, VehicleType};

const MILLIS_PER_HOUR: i128 = 3_600_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FareError {
    #[error("Out time is missing")]
    MissingOutTime,

    #[error("Out time {out_time} is before in time {in_time}")]
    InvalidInterval {
        in_time: DateTime<Utc>,
        out_time: DateTime<Utc>,
    },

    #[error("Hourly rate for {vehicle_type} must be positive, got {rate} cents")]
    InvalidRate {
        vehicle_type: VehicleType,
        rate: Cents,
    },

    #[error("Discount must be between 0 and 100 percent, got {0}")]
    InvalidDiscount(u8),

    #[error("Fare for this stay exceeds the largest representable amount")]
    PriceOverflow,
}

/// Tariff applied to every exit. Built once at startup and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareConfig {
    pub car_rate_per_hour: Cents,
    pub bike_rate_per_hour: Cents,
    /// Percentage taken off the fare of a recurring customer
    pub recurring_discount_percent: u8,
    /// Stays shorter than this are free
    pub grace_period_minutes: i64,
}

impl FareConfig {
    pub const DEFAULT_CAR_RATE: Cents = 150;
    pub const DEFAULT_BIKE_RATE: Cents = 100;
    pub const DEFAULT_DISCOUNT_PERCENT: u8 = 5;
    pub const GRACE_PERIOD_MINUTES: i64 = 30;

    pub fn new(
        car_rate_per_hour: Cents,
        bike_rate_per_hour: Cents,
        recurring_discount_percent: u8,
    ) -> Result<Self, FareError> {
        let config = Self {
            car_rate_per_hour,
            bike_rate_per_hour,
            recurring_discount_percent,
            grace_period_minutes: Self::GRACE_PERIOD_MINUTES,
        };

        for vehicle_type in VehicleType::ALL {
            let rate = config.hourly_rate(vehicle_type);
            if rate <= 0 {
                return Err(FareError::InvalidRate { vehicle_type, rate });
            }
        }
        if recurring_discount_percent > 100 {
            return Err(FareError::InvalidDiscount(recurring_discount_percent));
        }

        Ok(config)
    }

    pub fn hourly_rate(&self, vehicle_type: VehicleType) -> Cents {
        match vehicle_type {
            VehicleType::Car => self.car_rate_per_hour,
            VehicleType::Bike => self.bike_rate_per_hour,
        }
    }

    /// Percentage of the full fare a customer pays.
    fn payable_percent(&self, apply_discount: bool) -> i128 {
        if apply_discount {
            100 - i128::from(self.recurring_discount_percent)
        } else {
            100
        }
    }
}

impl Default for FareConfig {
    fn default() -> Self {
        Self {
            car_rate_per_hour: Self::DEFAULT_CAR_RATE,
            bike_rate_per_hour: Self::DEFAULT_BIKE_RATE,
            recurring_discount_percent: Self::DEFAULT_DISCOUNT_PERCENT,
            grace_period_minutes: Self::GRACE_PERIOD_MINUTES,
        }
    }
}

/// Prices a parking stay. Pure: the same inputs always give the same price.
#[derive(Debug, Clone, Copy, Default)]
pub struct FareCalculator {
    config: FareConfig,
}

impl FareCalculator {
    pub fn new(config: FareConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FareConfig {
        &self.config
    }

    /// Compute the price in cents of a stay between `in_time` and `out_time`.
    ///
    /// Stays under the grace period are free. Longer stays are billed pro rata
    /// to the millisecond: `hours * hourly_rate * discount`, rounded half-up to
    /// the cent only once, on the final amount.
    pub fn calculate_fare(
        &self,
        in_time: DateTime<Utc>,
        out_time: Option<DateTime<Utc>>,
        vehicle_type: VehicleType,
        apply_discount: bool,
    ) -> Result<Cents, FareError> {
        let out_time = out_time.ok_or(FareError::MissingOutTime)?;
        if out_time < in_time {
            return Err(FareError::InvalidInterval { in_time, out_time });
        }

        let duration = out_time - in_time;
        if duration < Duration::minutes(self.config.grace_period_minutes) {
            return Ok(0);
        }

        let numerator = i128::from(duration.num_milliseconds())
            .checked_mul(i128::from(self.config.hourly_rate(vehicle_type)))
            .and_then(|n| n.checked_mul(self.config.payable_percent(apply_discount)))
            .ok_or(FareError::PriceOverflow)?;
        let denominator = MILLIS_PER_HOUR * 100;

        round_half_up(numerator, denominator)
    }
}

/// Integer division rounding halves away from zero. Both operands are non-negative here.
fn round_half_up(numerator: i128, denominator: i128) -> Result<Cents, FareError> {
    let rounded = numerator
        .checked_add(denominator / 2)
        .ok_or(FareError::PriceOverflow)?
        / denominator;
    Cents::try_from(rounded).map_err(|_| FareError::PriceOverflow)
}
