use crate::db_types::{CallRecord, NewCall};
use crate::error::AppError;

use async_trait::async_trait;
use sqlx::types::time::OffsetDateTime;
use sqlx::{Pool, Postgres};
use tracing::error;

/// Seam to the call store.  The service only needs append and a windowed
/// read; everything else (schema, retention) lives outside this crate.
#[async_trait]
pub trait CallStore: Send + Sync {
    /// Append one record.  The store assigns `id` and `created_at`.
    async fn insert_call(&self, call: NewCall) -> Result<CallRecord, AppError>;

    /// All records whose `start_time` falls in the closed range
    /// `[start, end]`, newest first.
    async fn calls_in_window(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<CallRecord>, AppError>;
}

pub struct PgCallStore {
    pool: Pool<Postgres>,
}

impl PgCallStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CallStore for PgCallStore {
    async fn insert_call(&self, call: NewCall) -> Result<CallRecord, AppError> {
        sqlx::query_as::<_, CallRecord>(
            "
            insert into calls (
              call_id,
              call_type,
              from_number,
              to_number,
              duration,
              rating,
              appointment_booked,
              summary,
              start_time,
              end_time,
              sentiment
            ) values (
              $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11
            )
            returning *
            ",
        )
        .bind(&call.call_id)
        .bind(&call.call_type)
        .bind(&call.from_number)
        .bind(&call.to_number)
        .bind(call.duration)
        .bind(call.rating)
        .bind(call.appointment_booked)
        .bind(&call.summary)
        .bind(call.start_time)
        .bind(call.end_time)
        .bind(&call.sentiment)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!(error=%e, "failed to insert call row");
            AppError::Storage("Failed to store call data")
        })
    }

    async fn calls_in_window(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<CallRecord>, AppError> {
        sqlx::query_as::<_, CallRecord>(
            "
            select *
            from calls
            where start_time >= $1
              and start_time <= $2
            order by start_time desc
            ",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(error=%e, "failed to fetch calls for window");
            AppError::Storage("Failed to fetch call data")
        })
    }
}
