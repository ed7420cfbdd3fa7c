use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named price tier applicable to a subset of seats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tariff {
    pub label: String,
    pub price: f32,
}

impl Tariff {
    pub fn new(label: impl Into<String>, price: f32) -> Self {
        Self {
            label: label.into(),
            price,
        }
    }
}

/// Natural key of a performance. The same show can play several venues and
/// the same venue hosts several dates; the store additionally keys
/// performances by an internal surrogate id that never appears here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PerformanceKey {
    pub show: String,
    pub venue: String,
    pub starts_at: DateTime<Utc>,
}

impl fmt::Display for PerformanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.show, self.venue, self.starts_at)
    }
}

/// One scheduled instance of a show at a venue and time, with the price
/// classes it sells. Immutable snapshot sourced from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub show: String,
    pub venue: String,
    pub starts_at: DateTime<Utc>,
    pub tariffs: Vec<Tariff>,
}

impl Performance {
    pub fn new(
        show: impl Into<String>,
        venue: impl Into<String>,
        starts_at: DateTime<Utc>,
        tariffs: Vec<Tariff>,
    ) -> Self {
        Self {
            show: show.into(),
            venue: venue.into(),
            starts_at,
            tariffs,
        }
    }

    pub fn key(&self) -> PerformanceKey {
        PerformanceKey {
            show: self.show.clone(),
            venue: self.venue.clone(),
            starts_at: self.starts_at,
        }
    }

    /// Looks up one of this performance's price classes by label.
    pub fn tariff(&self, label: &str) -> Option<&Tariff> {
        self.tariffs.iter().find(|t| t.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tariff_lookup() {
        let performance = Performance::new(
            "Hamlet",
            "RoomA",
            Utc::now(),
            vec![Tariff::new("Full", 20.0), Tariff::new("Reduced", 10.0)],
        );

        assert_eq!(performance.tariff("Reduced").unwrap().price, 10.0);
        assert!(performance.tariff("Balcony").is_none());
    }

    #[test]
    fn test_key_carries_natural_identity() {
        let starts_at = Utc::now();
        let performance = Performance::new("Hamlet", "RoomA", starts_at, vec![]);
        let key = performance.key();

        assert_eq!(key.show, "Hamlet");
        assert_eq!(key.venue, "RoomA");
        assert_eq!(key.starts_at, starts_at);
    }
}
