mod handlers;

use axum::{routing::get, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/exams/combined/marks", get(handlers::combined_marks))
        .route("/exams/combined/export", get(handlers::combined_export))
}

#[cfg(test)]
mod tests;
