use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{get_moon_details, get_sky_summary, health};

pub fn init_sky_router() -> Router<AppState> {
    Router::new()
        .route("/moon-details", get(get_moon_details))
        .route("/sky-summary", get(get_sky_summary))
        .route("/health", get(health))
}
