use tracing::warn;

use parterre_core::repository::{ReservationStore, StoreError};

use crate::holds::HoldBatch;

/// One reservation session: a store connection bound to the identity that
/// will own every reservation made through it.
///
/// Not shareable across threads without external synchronization; the
/// engine performs no locking of its own. Callers instantiate one session
/// per identity.
pub struct ReservationSession<S> {
    pub(crate) store: S,
    pub(crate) holder: String,
    pub(crate) active_hold: Option<HoldBatch>,
}

impl<S: ReservationStore> ReservationSession<S> {
    pub fn new(store: S, holder: impl Into<String>) -> Self {
        Self {
            store,
            holder: holder.into(),
            active_hold: None,
        }
    }

    /// Identity reservations made through this session are attributed to.
    pub fn holder(&self) -> &str {
        &self.holder
    }

    /// The hold batch secured by the most recent stable listing, if any.
    pub fn active_hold(&self) -> Option<&HoldBatch> {
        self.active_hold.as_ref()
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Rolls back the open transaction after a store failure, logging
    /// instead of masking the original error if the rollback itself fails.
    pub(crate) async fn abort_tx(&mut self) {
        if let Err(e) = self.store.rollback().await {
            warn!(error = %e, "rollback failed after store error");
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// `reserve_seats` was called while a provisional hold batch is still
    /// outstanding. Finalize or release the hold first.
    #[error("a provisional hold batch is still outstanding")]
    HoldPending,

    /// `finalize_hold` was called with no outstanding hold batch.
    #[error("no provisional hold batch is outstanding")]
    NoActiveHold,

    #[error(transparent)]
    Store(#[from] StoreError),
}
