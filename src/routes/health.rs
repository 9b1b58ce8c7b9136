use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use diesel::prelude::*;
use serde_json::json;
use std::sync::Arc;

use crate::{AppState, db::models::api::ApiResponse};

/// Liveness plus a database round trip.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database_ok = match state.db.get() {
        Ok(mut conn) => diesel::sql_query("SELECT 1").execute(&mut conn).is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the database pool");
            false
        }
    };

    let body = json!({
        "status": "ok",
        "database": if database_ok { "ok" } else { "unavailable" },
    });
    (StatusCode::OK, Json(ApiResponse::success(body, "Service is running")))
}
