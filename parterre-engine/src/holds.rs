use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use parterre_core::performance::{Performance, PerformanceKey};
use parterre_core::repository::{InsertOutcome, PerformanceId, ReservationStore};
use parterre_core::seat::Seat;

use crate::session::{EngineError, ReservationSession};

/// Seats provisionally secured by the most recent stable listing. No stored
/// field distinguishes these records from confirmed bookings; the batch is
/// pure session-local bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldBatch {
    pub performance: PerformanceKey,
    pub seats: Vec<Seat>,
}

impl HoldBatch {
    pub fn seat_numbers(&self) -> Vec<i32> {
        self.seats.iter().map(|s| s.number).collect()
    }
}

impl<S: ReservationStore> ReservationSession<S> {
    /// Provisionally reserves every candidate seat and records the subset
    /// actually secured as the session's active hold batch. A seat lost to
    /// a concurrent party shrinks the batch; it does not fail the call.
    /// Securing nothing leaves no active hold.
    pub(crate) async fn hold_free_seats(
        &mut self,
        performance: &Performance,
        candidates: Vec<Seat>,
    ) -> Result<(), EngineError> {
        if let Some(previous) = self.active_hold.take() {
            warn!(
                performance = %previous.performance,
                seats = previous.seats.len(),
                "replacing an unfinalized hold batch; its seats stay reserved until released"
            );
        }

        if candidates.is_empty() {
            return Ok(());
        }

        let key = performance.key();
        let id = self.store.performance_id(&key).await?;

        self.store.begin().await?;
        match self.insert_tolerating_conflicts(&key, id, candidates).await {
            Ok(secured) => {
                self.store.commit().await?;
                if !secured.is_empty() {
                    self.active_hold = Some(HoldBatch {
                        performance: key,
                        seats: secured,
                    });
                }
                Ok(())
            }
            Err(e) => {
                self.abort_tx().await;
                Err(e)
            }
        }
    }

    async fn insert_tolerating_conflicts(
        &mut self,
        key: &PerformanceKey,
        id: PerformanceId,
        candidates: Vec<Seat>,
    ) -> Result<Vec<Seat>, EngineError> {
        let mut secured = Vec::with_capacity(candidates.len());
        for seat in candidates {
            match self
                .store
                .insert_reservation(seat.number, &key.venue, id, &self.holder)
                .await?
            {
                InsertOutcome::Inserted => secured.push(seat.held()),
                InsertOutcome::Conflict => {
                    debug!(seat = seat.number, "seat lost to a concurrent session during stable listing");
                }
            }
        }
        Ok(secured)
    }

    /// Finalizes the active hold batch: the reservation records of
    /// `confirmed` seats stay in place, every other held seat is released,
    /// in one transaction committed once. Afterwards the only records under
    /// this session's identity for that performance are exactly the
    /// confirmed ones, plus any unrelated earlier bookings.
    pub async fn finalize_hold(&mut self, confirmed: &[Seat]) -> Result<Vec<Seat>, EngineError> {
        let batch = self.active_hold.clone().ok_or(EngineError::NoActiveHold)?;
        let keep: HashSet<i32> = confirmed.iter().map(|s| s.number).collect();

        let id = self.store.performance_id(&batch.performance).await?;

        self.store.begin().await?;
        match self.delete_unconfirmed(&batch, id, &keep).await {
            Ok(()) => {
                self.store.commit().await?;
                self.active_hold = None;
                debug!(confirmed = confirmed.len(), "hold batch finalized");
                Ok(confirmed.iter().map(Seat::held).collect())
            }
            Err(e) => {
                self.abort_tx().await;
                // The batch stays active: its records are all still in place.
                Err(e)
            }
        }
    }

    async fn delete_unconfirmed(
        &mut self,
        batch: &HoldBatch,
        id: PerformanceId,
        keep: &HashSet<i32>,
    ) -> Result<(), EngineError> {
        for seat in &batch.seats {
            if !keep.contains(&seat.number) {
                self.store
                    .delete_reservation(seat.number, &batch.performance.venue, id, &self.holder)
                    .await?;
            }
        }
        Ok(())
    }

    /// Abandons the active hold batch entirely, releasing every seat it
    /// secured. A no-op when no hold is outstanding.
    pub async fn release_hold(&mut self) -> Result<(), EngineError> {
        if self.active_hold.is_none() {
            return Ok(());
        }
        self.finalize_hold(&[]).await.map(|_| ())
    }
}
