pub mod availability;
pub mod booking;
pub mod catalog;
pub mod holds;
pub mod session;

pub use availability::Consistency;
pub use holds::HoldBatch;
pub use session::{EngineError, ReservationSession};
