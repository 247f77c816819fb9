mod handlers;

use axum::{
    routing::{delete, get},
    Router,
};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/catalog", get(handlers::list_catalog).post(handlers::add_subject))
        .route("/catalog/search", get(handlers::search_subjects))
        .route("/catalog/:subject_id", delete(handlers::deactivate_subject))
        .route("/programmes", get(handlers::list_programmes))
        .route("/valid-semesters", get(handlers::list_valid_semesters))
}

#[cfg(test)]
mod tests;
