use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgConnection;
use sqlx::{Connection, Executor};
use tracing::info;

use parterre_core::performance::{PerformanceKey, Tariff};
use parterre_core::repository::{
    FreeSeatRow, InsertOutcome, PerformanceId, PerformanceRow, ReservationStore, SeatStatusRow,
    StoreError,
};

/// Postgres-backed reservation store. One instance wraps one dedicated
/// database session, driven by a single caller thread; concurrent sessions
/// each open their own.
pub struct PostgresReservationStore {
    conn: PgConnection,
    // Natural-key -> surrogate id memo, so mutating calls don't pay the
    // lookup query every time.
    id_cache: HashMap<PerformanceKey, PerformanceId>,
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct PerformanceRecord {
    id: i64,
    show_name: String,
    venue: String,
    starts_at: DateTime<Utc>,
    label: String,
    price: f32,
}

#[derive(sqlx::FromRow)]
struct SeatStatusRecord {
    seat_number: i32,
    price_label: String,
    price: f32,
    holder: Option<String>,
}

#[derive(sqlx::FromRow)]
struct FreeSeatRecord {
    seat_number: i32,
    price_label: String,
    price: f32,
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(Box::new(e))
}

impl PostgresReservationStore {
    /// Opens a dedicated connection for one reservation session. Fails
    /// outright on a connection error; there is no half-initialized state.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let conn = PgConnection::connect(url).await.map_err(backend)?;
        info!("reservation store connected");

        Ok(Self {
            conn,
            id_cache: HashMap::new(),
        })
    }

    pub async fn migrate(&mut self) -> Result<(), StoreError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&mut self.conn)
            .await
            .map_err(|e| StoreError::Backend(Box::new(e)))?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}

#[async_trait]
impl ReservationStore for PostgresReservationStore {
    async fn performances_in_range(
        &mut self,
        show: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PerformanceRow>, StoreError> {
        let rows: Vec<PerformanceRecord> = sqlx::query_as(
            r#"
            SELECT p.id, p.show_name, p.venue, p.starts_at, pc.label, pc.price
            FROM performances p
            JOIN price_classes pc ON pc.performance_id = p.id
            WHERE p.show_name = $1 AND p.starts_at >= $2 AND p.starts_at <= $3
            ORDER BY p.id
            "#,
        )
        .bind(show)
        .bind(from)
        .bind(to)
        .fetch_all(&mut self.conn)
        .await
        .map_err(backend)?;

        Ok(rows
            .into_iter()
            .map(|r| PerformanceRow {
                id: r.id,
                show: r.show_name,
                venue: r.venue,
                starts_at: r.starts_at,
                tariff_label: r.label,
                tariff_price: r.price,
            })
            .collect())
    }

    async fn performance_id(
        &mut self,
        key: &PerformanceKey,
    ) -> Result<PerformanceId, StoreError> {
        if let Some(id) = self.id_cache.get(key) {
            return Ok(*id);
        }

        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM performances WHERE show_name = $1 AND venue = $2 AND starts_at = $3",
        )
        .bind(&key.show)
        .bind(&key.venue)
        .bind(key.starts_at)
        .fetch_optional(&mut self.conn)
        .await
        .map_err(backend)?;

        match row {
            Some((id,)) => {
                self.id_cache.insert(key.clone(), id);
                Ok(id)
            }
            None => Err(StoreError::PerformanceNotFound(key.clone())),
        }
    }

    async fn seat_statuses(
        &mut self,
        key: &PerformanceKey,
    ) -> Result<Vec<SeatStatusRow>, StoreError> {
        // Outer join against reservations: null holder means the seat is free.
        let rows: Vec<SeatStatusRecord> = sqlx::query_as(
            r#"
            SELECT s.seat_number, s.price_label, pc.price, r.holder
            FROM performances p
            JOIN seats s ON s.venue = p.venue
            JOIN price_classes pc ON pc.performance_id = p.id AND pc.label = s.price_label
            LEFT OUTER JOIN reservations r
              ON r.performance_id = p.id AND r.seat_number = s.seat_number
            WHERE p.show_name = $1 AND p.venue = $2 AND p.starts_at = $3
            ORDER BY s.seat_number
            "#,
        )
        .bind(&key.show)
        .bind(&key.venue)
        .bind(key.starts_at)
        .fetch_all(&mut self.conn)
        .await
        .map_err(backend)?;

        Ok(rows
            .into_iter()
            .map(|r| SeatStatusRow {
                number: r.seat_number,
                tariff_label: r.price_label,
                tariff_price: r.price,
                holder: r.holder,
            })
            .collect())
    }

    async fn free_seats(
        &mut self,
        key: &PerformanceKey,
        tariff: Option<&Tariff>,
    ) -> Result<Vec<FreeSeatRow>, StoreError> {
        let rows: Vec<FreeSeatRecord> = if let Some(t) = tariff {
            sqlx::query_as(
                r#"
                SELECT s.seat_number, s.price_label, pc.price
                FROM performances p
                JOIN seats s ON s.venue = p.venue
                JOIN price_classes pc ON pc.performance_id = p.id AND pc.label = s.price_label
                WHERE p.show_name = $1 AND p.venue = $2 AND p.starts_at = $3
                  AND s.price_label = $4 AND pc.price = $5
                  AND NOT EXISTS (
                      SELECT 1 FROM reservations r
                      WHERE r.performance_id = p.id AND r.seat_number = s.seat_number)
                ORDER BY s.seat_number
                "#,
            )
            .bind(&key.show)
            .bind(&key.venue)
            .bind(key.starts_at)
            .bind(&t.label)
            .bind(t.price)
            .fetch_all(&mut self.conn)
            .await
            .map_err(backend)?
        } else {
            sqlx::query_as(
                r#"
                SELECT s.seat_number, s.price_label, pc.price
                FROM performances p
                JOIN seats s ON s.venue = p.venue
                JOIN price_classes pc ON pc.performance_id = p.id AND pc.label = s.price_label
                WHERE p.show_name = $1 AND p.venue = $2 AND p.starts_at = $3
                  AND NOT EXISTS (
                      SELECT 1 FROM reservations r
                      WHERE r.performance_id = p.id AND r.seat_number = s.seat_number)
                ORDER BY s.seat_number
                "#,
            )
            .bind(&key.show)
            .bind(&key.venue)
            .bind(key.starts_at)
            .fetch_all(&mut self.conn)
            .await
            .map_err(backend)?
        };

        Ok(rows
            .into_iter()
            .map(|r| FreeSeatRow {
                number: r.seat_number,
                tariff_label: r.price_label,
                tariff_price: r.price,
            })
            .collect())
    }

    async fn begin(&mut self) -> Result<(), StoreError> {
        self.conn
            .execute(sqlx::raw_sql("BEGIN"))
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        self.conn
            .execute(sqlx::raw_sql("COMMIT"))
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.conn
            .execute(sqlx::raw_sql("ROLLBACK"))
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn set_read_committed(&mut self) -> Result<(), StoreError> {
        self.conn
            .execute(sqlx::raw_sql(
                "SET SESSION CHARACTERISTICS AS TRANSACTION ISOLATION LEVEL READ COMMITTED",
            ))
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn insert_reservation(
        &mut self,
        seat_number: i32,
        venue: &str,
        performance: PerformanceId,
        holder: &str,
    ) -> Result<InsertOutcome, StoreError> {
        // ON CONFLICT DO NOTHING keeps a lost race from aborting the
        // surrounding transaction; zero rows affected means the seat was
        // already taken.
        let result = sqlx::query(
            r#"
            INSERT INTO reservations (seat_number, venue, performance_id, holder)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(seat_number)
        .bind(venue)
        .bind(performance)
        .bind(holder)
        .execute(&mut self.conn)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            Ok(InsertOutcome::Conflict)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }

    async fn delete_reservation(
        &mut self,
        seat_number: i32,
        venue: &str,
        performance: PerformanceId,
        holder: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            DELETE FROM reservations
            WHERE seat_number = $1 AND venue = $2 AND performance_id = $3 AND holder = $4
            "#,
        )
        .bind(seat_number)
        .bind(venue)
        .bind(performance)
        .bind(holder)
        .execute(&mut self.conn)
        .await
        .map_err(backend)?;

        Ok(())
    }
}
