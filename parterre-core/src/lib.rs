pub mod performance;
pub mod repository;
pub mod seat;

pub use performance::{Performance, PerformanceKey, Tariff};
pub use repository::{InsertOutcome, PerformanceId, ReservationStore, StoreError};
pub use seat::Seat;
