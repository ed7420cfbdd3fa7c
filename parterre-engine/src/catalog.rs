use chrono::{DateTime, Utc};

use parterre_core::performance::{Performance, Tariff};
use parterre_core::repository::{PerformanceRow, ReservationStore};

use crate::session::{EngineError, ReservationSession};

impl<S: ReservationStore> ReservationSession<S> {
    /// Lists the performances of a show starting between `from` and `to`
    /// (inclusive), in store insertion order. Read-only; no side effects.
    pub async fn list_performances(
        &mut self,
        show: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Performance>, EngineError> {
        let rows = self.store.performances_in_range(show, from, to).await?;
        Ok(group_rows(rows))
    }
}

/// Collapses per-price-class rows into one `Performance` per internal id.
/// Rows arrive ordered by id, so rows of the same performance form a
/// contiguous run.
fn group_rows(rows: Vec<PerformanceRow>) -> Vec<Performance> {
    let mut performances: Vec<Performance> = Vec::new();
    let mut current_id = None;

    for row in rows {
        let tariff = Tariff::new(row.tariff_label, row.tariff_price);
        if current_id == Some(row.id) {
            if let Some(last) = performances.last_mut() {
                last.tariffs.push(tariff);
            }
        } else {
            current_id = Some(row.id);
            performances.push(Performance::new(
                row.show,
                row.venue,
                row.starts_at,
                vec![tariff],
            ));
        }
    }

    performances
}
