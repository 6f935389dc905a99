use std::io::{self, BufRead, StdinLock, Write};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to read input: {0}")]
    Io(#[from] io::Error),

    #[error("Expected a number, got '{0}'")]
    InvalidNumber(String),

    #[error("Vehicle registration number must not be empty")]
    EmptyRegistration,

    #[error("No more input available")]
    Exhausted,
}

/// Source of operator answers for the entry and exit workflows.
pub trait InputReader {
    /// Menu choice for the vehicle type (1 = car, 2 = bike).
    fn read_selection(&mut self) -> Result<u32, InputError>;

    /// Registration plate of the vehicle, trimmed and non-empty.
    fn read_vehicle_registration_number(&mut self) -> Result<String, InputError>;
}

/// Trim a registration number and reject blank ones.
pub fn normalize_registration(raw: &str) -> Result<String, InputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InputError::EmptyRegistration);
    }
    Ok(trimmed.to_string())
}

/// Interactive input: prompts on stdout and reads one line per answer.
pub struct ConsoleInput<R> {
    reader: R,
}

impl ConsoleInput<StdinLock<'static>> {
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock())
    }
}

impl<R: BufRead> ConsoleInput<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Read one line without its terminator. End of input is an error.
    pub fn read_line(&mut self) -> Result<String, InputError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(InputError::Exhausted);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Read a menu number.
    pub fn read_number(&mut self) -> Result<u32, InputError> {
        let line = self.read_line()?;
        line.trim()
            .parse()
            .map_err(|_| InputError::InvalidNumber(line.trim().to_string()))
    }
}

impl<R: BufRead> InputReader for ConsoleInput<R> {
    fn read_selection(&mut self) -> Result<u32, InputError> {
        println!("Please select vehicle type from menu");
        println!("1 CAR");
        println!("2 BIKE");
        io::stdout().flush()?;
        self.read_number()
    }

    fn read_vehicle_registration_number(&mut self) -> Result<String, InputError> {
        println!("Please type the vehicle registration number and press enter key");
        io::stdout().flush()?;
        let line = self.read_line()?;
        normalize_registration(&line)
    }
}

/// Non-interactive input answering every prompt with the same values,
/// used when the vehicle type and plate come from command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct FixedInput {
    selection: Option<u32>,
    registration: Option<String>,
}

impl FixedInput {
    pub fn new(selection: Option<u32>, registration: Option<String>) -> Self {
        Self {
            selection,
            registration,
        }
    }

    pub fn entering(selection: u32, registration: impl Into<String>) -> Self {
        Self::new(Some(selection), Some(registration.into()))
    }

    pub fn exiting(registration: impl Into<String>) -> Self {
        Self::new(None, Some(registration.into()))
    }
}

impl InputReader for FixedInput {
    fn read_selection(&mut self) -> Result<u32, InputError> {
        self.selection.ok_or(InputError::Exhausted)
    }

    fn read_vehicle_registration_number(&mut self) -> Result<String, InputError> {
        let raw = self.registration.as_deref().ok_or(InputError::Exhausted)?;
        normalize_registration(raw)
    }
}
