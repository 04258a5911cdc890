use crate::db_types::NewCall;
use crate::error::AppError;

use serde::Deserialize;
use time::OffsetDateTime;
use tracing::warn;

/// Call-completed event as posted by the Retell agent.  Everything except
/// `call_id` is optional; ingestion fills in defaults.
#[derive(Deserialize, Debug)]
pub struct RetellCallWebhook {
    pub call_id: Option<String>,
    pub call_type: Option<String>,
    pub from_number: Option<String>,
    pub to_number: Option<String>,
    pub duration: Option<i64>,
    pub rating: Option<f64>,
    pub appointment_booked: Option<bool>,
    pub summary: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_time: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_time: Option<OffsetDateTime>,
    pub sentiment: Option<String>,
}

fn field_or(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => default.to_string(),
    }
}

impl RetellCallWebhook {
    /// Normalize the raw event into a fully-populated insert payload.
    ///
    /// The only validation is the presence of a non-empty `call_id`; every
    /// other field gets a default.  Out-of-range numerics are clamped rather
    /// than rejected.  Missing timestamps fall back to `now`, which
    /// fabricates a start time for the record; the fallback is logged so the
    /// gap stays visible.
    pub fn into_new_call(self, now: OffsetDateTime) -> Result<NewCall, AppError> {
        let call_id = match self.call_id {
            Some(id) if !id.is_empty() => id,
            _ => return Err(AppError::InvalidPayload("Invalid webhook data")),
        };

        let start_time = match self.start_time {
            Some(t) => t,
            None => {
                warn!(call_id=%call_id, "webhook missing start_time; defaulting to ingestion time");
                now
            }
        };

        Ok(NewCall {
            call_type: field_or(self.call_type, "unknown"),
            from_number: field_or(self.from_number, "unknown"),
            to_number: field_or(self.to_number, "unknown"),
            duration: self.duration.unwrap_or(0).max(0),
            rating: self.rating.unwrap_or(0.0).clamp(0.0, 5.0),
            appointment_booked: self.appointment_booked.unwrap_or(false),
            summary: self.summary.unwrap_or_default(),
            start_time,
            end_time: self.end_time.unwrap_or(now),
            sentiment: field_or(self.sentiment, "neutral"),
            call_id,
        })
    }
}
