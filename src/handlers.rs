use crate::analysis::dashboard_data;
use crate::consts::DEFAULT_WINDOW_DAYS;
use crate::dashboard_types::DashboardData;
use crate::error::AppError;
use crate::retell_types::RetellCallWebhook;
use crate::types::AppState;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::{Duration, OffsetDateTime};
use tracing::{debug, error, info};
use uuid::Uuid;

#[derive(Serialize, Debug)]
pub struct IngestResponse {
    pub message: &'static str,
    pub id: Uuid,
}

/// Call-completed webhook: normalize the event and append one record.
/// Replayed deliveries insert duplicates; dedup is the sender's problem.
pub async fn retell_webhook(
    State(app_state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<IngestResponse>, AppError> {
    debug!(body=%body, "webhook request body");
    let payload = serde_json::from_str::<RetellCallWebhook>(&body).map_err(|e| {
        error!(error=%e, "failed to deserialize webhook payload");
        AppError::InvalidPayload("Invalid webhook data")
    })?;

    let call = payload.into_new_call(OffsetDateTime::now_utc())?;
    let record = app_state.store.insert_call(call).await?;
    info!(id=%record.id, call_id=%record.call_id, "stored call record");

    Ok(Json(IngestResponse {
        message: "Call data received and stored",
        id: record.id,
    }))
}

#[derive(Deserialize, Debug, Default)]
pub struct AnalysisParams {
    pub days: Option<String>,
}

/// Dashboard read path: fetch the trailing window and aggregate every view
/// for it.  `days` falls back to the default when absent or unparsable and
/// clamps at zero.
pub async fn call_analysis(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<AnalysisParams>,
) -> Result<Json<DashboardData>, AppError> {
    let days = params
        .days
        .and_then(|d| d.parse::<i64>().ok())
        .unwrap_or(DEFAULT_WINDOW_DAYS)
        .max(0);

    let now = OffsetDateTime::now_utc();
    let start = now
        .checked_sub(Duration::days(days))
        .unwrap_or(OffsetDateTime::UNIX_EPOCH);
    let calls = app_state.store.calls_in_window(start, now).await?;
    debug!(days, count = calls.len(), "fetched calls for analysis window");

    let mut rng = rand::thread_rng();
    Ok(Json(dashboard_data(&calls, days, now, &mut rng)))
}
