use axum::{routing::get, Router};

use super::handlers::{jobs, probes};
use super::state::AppState;

pub fn build_routes(state: AppState) -> Router {
    Router::new()
        .route("/jobs", get(jobs::list).post(jobs::create))
        .route(
            "/jobs/{id}",
            get(jobs::retrieve).patch(jobs::update).delete(jobs::delete),
        )
        .route("/healthz", get(probes::healthz))
        .route("/livez", get(probes::livez))
        .with_state(state)
}
