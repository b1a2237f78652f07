//! Fixed hall topology: rows × seats-per-row, seat labels and the
//! availability map. Everything here is a pure function of the two
//! dimensions.

use std::collections::HashSet;
use thiserror::Error;

use crate::models::{SeatId, SeatMarker};

pub const DEFAULT_ROWS: u8 = 5;
pub const DEFAULT_SEATS_PER_ROW: u16 = 10;
/// Row letters run A..=Z.
pub const MAX_ROWS: u8 = 26;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeatError {
    #[error("invalid seat label '{0}'")]
    InvalidSeatLabel(String),
    #[error("invalid seat grid {rows}x{seats_per_row}: rows must be 1..={max}, seats per row at least 1", max = MAX_ROWS)]
    InvalidTopology { rows: u8, seats_per_row: u16 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatGrid {
    rows: u8,
    seats_per_row: u16,
}

impl Default for SeatGrid {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            seats_per_row: DEFAULT_SEATS_PER_ROW,
        }
    }
}

impl SeatGrid {
    pub fn new(rows: u8, seats_per_row: u16) -> Result<Self, SeatError> {
        if rows == 0 || rows > MAX_ROWS || seats_per_row == 0 {
            return Err(SeatError::InvalidTopology { rows, seats_per_row });
        }
        Ok(Self { rows, seats_per_row })
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn seats_per_row(&self) -> u16 {
        self.seats_per_row
    }

    pub fn capacity(&self) -> usize {
        usize::from(self.rows) * usize::from(self.seats_per_row)
    }

    pub fn contains(&self, seat: SeatId) -> bool {
        seat.row < self.rows && seat.column < self.seats_per_row
    }

    /// Every seat in row-major order. Each call starts over.
    pub fn all_seats(&self) -> impl Iterator<Item = SeatId> {
        let Self { rows, seats_per_row } = *self;
        (0..rows).flat_map(move |row| (0..seats_per_row).map(move |column| SeatId::new(row, column)))
    }

    pub fn label(&self, seat: SeatId) -> String {
        seat.label()
    }

    /// Parses `<Letter><Number>` exactly; case-insensitive, no padding,
    /// no sign, no leading zero.
    pub fn parse(&self, label: &str) -> Result<SeatId, SeatError> {
        let invalid = || SeatError::InvalidSeatLabel(label.to_string());
        let canonical = label.to_ascii_uppercase();
        let mut chars = canonical.chars();

        let letter = chars.next().filter(char::is_ascii_uppercase).ok_or_else(invalid)?;
        // ascii uppercase, so the subtraction cannot wrap
        let row = letter as u8 - b'A';
        if row >= self.rows {
            return Err(invalid());
        }

        let digits = chars.as_str();
        if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let number: u16 = digits.parse().map_err(|_| invalid())?;
        if number > self.seats_per_row {
            return Err(invalid());
        }

        Ok(SeatId::new(row, number - 1))
    }

    /// rows × seats-per-row matrix of markers for the given booked set.
    pub fn render(&self, booked: &HashSet<SeatId>) -> Vec<Vec<SeatMarker>> {
        (0..self.rows)
            .map(|row| {
                (0..self.seats_per_row)
                    .map(|column| {
                        if booked.contains(&SeatId::new(row, column)) {
                            SeatMarker::Booked
                        } else {
                            SeatMarker::Available
                        }
                    })
                    .collect()
            })
            .collect()
    }
}
