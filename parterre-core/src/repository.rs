use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::performance::{PerformanceKey, Tariff};

/// Store-internal surrogate identifier of a performance. Deliberately absent
/// from the public domain values; resolved from the natural key on demand.
pub type PerformanceId = i64;

/// One row per (performance, price class), ordered by internal id. A
/// performance selling three price classes arrives as three consecutive rows.
#[derive(Debug, Clone)]
pub struct PerformanceRow {
    pub id: PerformanceId,
    pub show: String,
    pub venue: String,
    pub starts_at: DateTime<Utc>,
    pub tariff_label: String,
    pub tariff_price: f32,
}

/// One seat of a performance with its current holder, ordered by seat
/// number. `holder` is None when the seat is free.
#[derive(Debug, Clone)]
pub struct SeatStatusRow {
    pub number: i32,
    pub tariff_label: String,
    pub tariff_price: f32,
    pub holder: Option<String>,
}

/// A currently-free seat candidate for quantity booking, with the price
/// class it actually belongs to.
#[derive(Debug, Clone)]
pub struct FreeSeatRow {
    pub number: i32,
    pub tariff_label: String,
    pub tariff_price: f32,
}

/// Result of attempting to insert one reservation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The uniqueness constraint over (performance, seat) fired: another
    /// holder already has the seat. Reported without aborting the
    /// surrounding transaction.
    Conflict,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("performance not found: {0}")]
    PerformanceNotFound(PerformanceKey),

    #[error("store backend failure: {0}")]
    Backend(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Persistent-store collaborator contract for one reservation session.
///
/// Methods take `&mut self`: an implementation wraps exactly one database
/// connection, driven synchronously by one caller thread. Transaction
/// demarcation is explicit; every statement issued between `begin` and
/// `commit`/`rollback` belongs to that transaction.
#[async_trait]
pub trait ReservationStore: Send {
    /// Performances of a show starting between `from` and `to` (inclusive),
    /// one row per price class, ordered by internal id ascending.
    async fn performances_in_range(
        &mut self,
        show: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PerformanceRow>, StoreError>;

    /// Resolves the natural key to the internal id. Implementations should
    /// cache the mapping; mutating calls hit this on every invocation.
    async fn performance_id(&mut self, key: &PerformanceKey)
        -> Result<PerformanceId, StoreError>;

    /// All seats of the performance outer-joined against reservation
    /// records, ordered by seat number.
    async fn seat_statuses(
        &mut self,
        key: &PerformanceKey,
    ) -> Result<Vec<SeatStatusRow>, StoreError>;

    /// Currently-free seats of the performance in ascending seat-number
    /// order, optionally restricted to one price class (matched on label
    /// and price).
    async fn free_seats(
        &mut self,
        key: &PerformanceKey,
        tariff: Option<&Tariff>,
    ) -> Result<Vec<FreeSeatRow>, StoreError>;

    async fn begin(&mut self) -> Result<(), StoreError>;

    async fn commit(&mut self) -> Result<(), StoreError>;

    async fn rollback(&mut self) -> Result<(), StoreError>;

    /// Requests at least READ COMMITTED isolation for subsequent reads.
    async fn set_read_committed(&mut self) -> Result<(), StoreError>;

    async fn insert_reservation(
        &mut self,
        seat_number: i32,
        venue: &str,
        performance: PerformanceId,
        holder: &str,
    ) -> Result<InsertOutcome, StoreError>;

    async fn delete_reservation(
        &mut self,
        seat_number: i32,
        venue: &str,
        performance: PerformanceId,
        holder: &str,
    ) -> Result<(), StoreError>;
}
