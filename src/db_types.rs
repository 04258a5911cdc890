use serde::Serialize;
use sqlx::types::time::OffsetDateTime;
use uuid::Uuid;

/// One completed agent call as persisted in the `calls` table.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct CallRecord {
    pub id: Uuid,
    pub call_id: String,
    pub call_type: String,
    pub from_number: String,
    pub to_number: String,
    /// Call length in seconds.
    pub duration: i64,
    /// Caller rating in [0, 5].
    pub rating: f64,
    pub appointment_booked: bool,
    pub summary: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_time: OffsetDateTime,
    pub sentiment: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Insert payload for a call row.  `id` and `created_at` are assigned by the
/// store on insert.
#[derive(Clone, Debug)]
pub struct NewCall {
    pub call_id: String,
    pub call_type: String,
    pub from_number: String,
    pub to_number: String,
    pub duration: i64,
    pub rating: f64,
    pub appointment_booked: bool,
    pub summary: String,
    pub start_time: OffsetDateTime,
    pub end_time: OffsetDateTime,
    pub sentiment: String,
}
