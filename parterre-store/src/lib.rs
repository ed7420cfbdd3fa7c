pub mod config;
pub mod reservation_repo;

pub use config::{Config, DatabaseConfig};
pub use reservation_repo::PostgresReservationStore;
