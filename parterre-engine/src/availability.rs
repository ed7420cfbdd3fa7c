use serde::{Deserialize, Serialize};

use parterre_core::performance::{Performance, Tariff};
use parterre_core::repository::ReservationStore;
use parterre_core::seat::Seat;

use crate::session::{EngineError, ReservationSession};

/// Consistency contract of a seat listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Consistency {
    /// One read of current reservation state. The free/held flags may be
    /// stale by the time the caller acts on them.
    Unstable,
    /// Same snapshot, but every seat it reports free is provisionally
    /// reserved under the session's identity, so no third party can take it
    /// before the caller finalizes. The returned flags still show the
    /// pre-hold ground truth.
    Stable,
}

impl<S: ReservationStore> ReservationSession<S> {
    /// Lists all seats of a performance, ordered by seat number.
    ///
    /// In stable mode the seats reported free become the session's new
    /// active hold batch, to be settled with `finalize_hold` or
    /// `release_hold`.
    pub async fn list_seats(
        &mut self,
        performance: &Performance,
        mode: Consistency,
    ) -> Result<Vec<Seat>, EngineError> {
        self.store.set_read_committed().await?;

        let key = performance.key();
        let rows = self.store.seat_statuses(&key).await?;
        let seats: Vec<Seat> = rows
            .into_iter()
            .map(|row| {
                Seat::new(
                    key.clone(),
                    row.number,
                    Tariff::new(row.tariff_label, row.tariff_price),
                    row.holder.is_none(),
                )
            })
            .collect();

        if mode == Consistency::Stable {
            let free: Vec<Seat> = seats.iter().filter(|s| s.free).cloned().collect();
            self.hold_free_seats(performance, free).await?;
        }

        Ok(seats)
    }
}
