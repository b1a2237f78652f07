use serde::{Serialize, Serializer};
use std::fmt;

/// A physical seat: zero-based row and column inside the hall topology.
///
/// Displayed as `<Letter><Number>`, e.g. row 0 / column 0 is `A1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeatId {
    pub row: u8,
    pub column: u16,
}

impl SeatId {
    pub const fn new(row: u8, column: u16) -> Self {
        Self { row, column }
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let column = u32::from(self.column) + 1;
        match b'A'.checked_add(self.row).filter(u8::is_ascii_uppercase) {
            Some(letter) => write!(f, "{}{}", char::from(letter), column),
            // Past Z there is no letter; no SeatGrid accepts such a row
            None => write!(f, "R{}C{}", u32::from(self.row) + 1, column),
        }
    }
}

// Seats leave the crate as their labels, never as raw coordinates
impl Serialize for SeatId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Availability marker for one cell of the rendered seat map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatMarker {
    Available,
    Booked,
}

impl SeatMarker {
    pub fn as_char(self) -> char {
        match self {
            SeatMarker::Available => 'O',
            SeatMarker::Booked => 'X',
        }
    }
}

impl fmt::Display for SeatMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Joins seat labels with `sep`, keeping the given order.
pub fn join_labels(seats: &[SeatId], sep: &str) -> String {
    seats
        .iter()
        .map(SeatId::label)
        .collect::<Vec<_>>()
        .join(sep)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_use_letter_for_row_and_one_based_column() {
        assert_eq!(SeatId::new(0, 0).label(), "A1");
        assert_eq!(SeatId::new(4, 9).label(), "E10");
        assert_eq!(SeatId::new(25, 99).label(), "Z100");
    }

    #[test]
    fn rows_past_z_fall_back_to_numeric_form() {
        assert_eq!(SeatId::new(26, 0).label(), "R27C1");
        assert_eq!(SeatId::new(u8::MAX, u16::MAX).label(), "R256C65536");
    }

    #[test]
    fn serializes_as_label() {
        let json = serde_json::to_string(&vec![SeatId::new(1, 2), SeatId::new(0, 0)]).unwrap();
        assert_eq!(json, r#"["B3","A1"]"#);
    }

    #[test]
    fn join_keeps_request_order() {
        let seats = [SeatId::new(0, 2), SeatId::new(0, 1)];
        assert_eq!(join_labels(&seats, ";"), "A3;A2");
        assert_eq!(join_labels(&[], ", "), "");
    }
}
