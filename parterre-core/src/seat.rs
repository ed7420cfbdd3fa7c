use serde::{Deserialize, Serialize};

use crate::performance::{PerformanceKey, Tariff};

/// A bookable unit of a performance, as seen at enumeration time. This is a
/// point-in-time snapshot, not a live handle: `free` reflects the state at
/// the instant the listing query ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seat {
    pub performance: PerformanceKey,
    pub number: i32,
    pub tariff: Tariff,
    pub free: bool,
}

impl Seat {
    pub fn new(performance: PerformanceKey, number: i32, tariff: Tariff, free: bool) -> Self {
        Self {
            performance,
            number,
            tariff,
            free,
        }
    }

    /// The same seat re-tagged as taken, for returning freshly booked seats.
    pub fn held(&self) -> Seat {
        Seat {
            free: false,
            ..self.clone()
        }
    }
}
