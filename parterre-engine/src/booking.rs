use tracing::debug;

use parterre_core::performance::{Performance, PerformanceKey, Tariff};
use parterre_core::repository::{InsertOutcome, PerformanceId, ReservationStore};
use parterre_core::seat::Seat;

use crate::session::{EngineError, ReservationSession};

impl<S: ReservationStore> ReservationSession<S> {
    /// Books `count` currently-free seats in ascending seat-number order,
    /// optionally restricted to one price class. All-or-nothing: on a
    /// shortfall, or a seat lost between selection and insert, the
    /// transaction is rolled back and the result is empty. Returned seats
    /// carry the price class they actually sold under.
    pub async fn reserve_by_quantity(
        &mut self,
        performance: &Performance,
        count: usize,
        tariff: Option<&Tariff>,
    ) -> Result<Vec<Seat>, EngineError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let key = performance.key();
        let id = self.store.performance_id(&key).await?;

        self.store.begin().await?;
        match self.book_first_free(&key, id, count, tariff).await {
            Ok(Some(seats)) => {
                self.store.commit().await?;
                Ok(seats)
            }
            Ok(None) => {
                self.store.rollback().await?;
                debug!(requested = count, "insufficient free seats, booking rolled back");
                Ok(Vec::new())
            }
            Err(e) => {
                self.abort_tx().await;
                Err(e)
            }
        }
    }

    async fn book_first_free(
        &mut self,
        key: &PerformanceKey,
        id: PerformanceId,
        count: usize,
        tariff: Option<&Tariff>,
    ) -> Result<Option<Vec<Seat>>, EngineError> {
        let free = self.store.free_seats(key, tariff).await?;
        if free.len() < count {
            return Ok(None);
        }

        let mut booked = Vec::with_capacity(count);
        for row in free.into_iter().take(count) {
            match self
                .store
                .insert_reservation(row.number, &key.venue, id, &self.holder)
                .await?
            {
                InsertOutcome::Inserted => booked.push(Seat::new(
                    key.clone(),
                    row.number,
                    Tariff::new(row.tariff_label, row.tariff_price),
                    false,
                )),
                // Lost between the snapshot and the insert; no retry.
                InsertOutcome::Conflict => return Ok(None),
            }
        }
        Ok(Some(booked))
    }

    /// Books exactly the listed seats. All-or-nothing: if any seat is
    /// already taken the transaction is rolled back and the result is empty.
    ///
    /// Fresh bookings only. While a provisional hold batch is outstanding
    /// this fails with `HoldPending`; settle the hold through
    /// `finalize_hold` or `release_hold` instead.
    pub async fn reserve_seats(
        &mut self,
        performance: &Performance,
        seats: &[Seat],
    ) -> Result<Vec<Seat>, EngineError> {
        if self.active_hold.is_some() {
            return Err(EngineError::HoldPending);
        }

        let key = performance.key();
        let id = self.store.performance_id(&key).await?;

        self.store.begin().await?;
        match self.book_exact(&key, id, seats).await {
            Ok(true) => {
                self.store.commit().await?;
                Ok(seats.iter().map(Seat::held).collect())
            }
            Ok(false) => {
                self.store.rollback().await?;
                debug!(holder = %self.holder, "seat list conflicted, booking rolled back");
                Ok(Vec::new())
            }
            Err(e) => {
                self.abort_tx().await;
                Err(e)
            }
        }
    }

    async fn book_exact(
        &mut self,
        key: &PerformanceKey,
        id: PerformanceId,
        seats: &[Seat],
    ) -> Result<bool, EngineError> {
        for seat in seats {
            if let InsertOutcome::Conflict = self
                .store
                .insert_reservation(seat.number, &key.venue, id, &self.holder)
                .await?
            {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
