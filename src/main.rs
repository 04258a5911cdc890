mod analysis;
mod dashboard_types;
mod db_types;
mod error;
mod handlers;
mod retell_types;
mod store;
mod types;

use crate::store::PgCallStore;
use crate::types::AppState;

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::sync::Arc;
use tracing_subscriber::prelude::*;

pub mod consts {
    pub const DEFAULT_WINDOW_DAYS: i64 = 7;
    pub const RECENT_CALLS_LIMIT: usize = 10;
    pub const MAX_RATING: f64 = 5.0;
    pub const NPS_PROMOTER_MIN: f64 = 4.5;
    pub const NPS_DETRACTOR_MAX: f64 = 3.5;
    // Placeholder compliance figures; nothing derives these from call
    // content yet.
    pub const COMPLIANCE_RATE: f64 = 98.5;
    pub const DATA_PROTECTION_SCORE: f64 = 9.2;
    pub const SECURITY_ISSUE_RATE: f64 = 0.02;
    pub const BUCKET_SECURITY_ISSUE_RATE: f64 = 0.03;
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let subscriber = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_file(true)
                .with_line_number(true),
        )
        .with(tracing_subscriber::filter::Targets::new().with_targets([
            ("hyper", tracing_subscriber::filter::LevelFilter::OFF),
            ("calldash_rs", tracing_subscriber::filter::LevelFilter::DEBUG),
        ]));
    tracing::subscriber::set_global_default(subscriber).unwrap();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL not set!");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("failed to connect to database");
    sqlx::migrate!()
        .run(&db_pool)
        .await
        .expect("failed to run migrations");

    let app_state = Arc::new(AppState {
        store: Arc::new(PgCallStore::new(db_pool)),
    });

    let app = Router::new()
        .route("/api/webhooks/retell", post(handlers::retell_webhook))
        .route("/api/call-analysis", get(handlers::call_analysis))
        .route("/", get(|| async { "Hello, World!" }))
        .with_state(app_state);

    axum::Server::bind(&"0.0.0.0:3000".parse().unwrap())
        .serve(app.into_make_service())
        .await
        .unwrap();
}
