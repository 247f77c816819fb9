mod handlers;

use axum::{routing::delete, routing::get, routing::post, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_exam).get(handlers::list_exams))
        .route("/:exam_id", get(handlers::get_exam).delete(handlers::delete_exam))
        .route(
            "/:exam_id/sections",
            post(handlers::create_section).get(handlers::list_sections),
        )
        .route("/:exam_id/sections/:section_id", delete(handlers::delete_section))
        .route("/:exam_id/marks", post(handlers::save_marks).get(handlers::get_marks))
        .route("/:exam_id/export", get(handlers::export_marks))
        .route("/:exam_id/finalize", post(handlers::finalize_exam))
        .route("/:exam_id/unfinalize", post(handlers::unfinalize_exam))
}
