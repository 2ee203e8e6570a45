use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{
    conf::settings,
    pkg::{
        internal::db::QueryExecutor,
        server::state::{AppState, GetTxn},
    },
    prelude::Result,
};

pub async fn livez() -> Result<()> {
    tracing::debug!("service is live");
    Ok(())
}

/// Round-trips a trivial statement through the same executor the job
/// routes use.
pub async fn healthz(State(state): State<AppState>) -> Result<Json<Value>> {
    let mut conn = state.db_pool.conn().await?;
    let rows = QueryExecutor::execute(&mut *conn, "SELECT 1 AS ok", Vec::new()).await?;
    let ok = rows.first().map(|row| row.get_i32("ok")).transpose()? == Some(1);
    tracing::debug!("health check: db ok = {}", ok);
    Ok(Json(json!({
        "service": settings.service_name,
        "database": if ok { "up" } else { "degraded" },
    })))
}
