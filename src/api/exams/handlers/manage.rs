use axum::extract::Path;
use axum::http::StatusCode;
use axum::Json;

use crate::api::errors::ApiError;
use crate::api::guards::{require_exam_access, CurrentUser};
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::exam::ExamResponse;
use crate::services::access::Actor;

pub(in crate::api::exams) async fn get_exam(
    Path(exam_id): Path<i64>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<ExamResponse>, ApiError> {
    let access = require_exam_access(&state, &user, exam_id).await?;
    Ok(Json(ExamResponse::from_db(access.exam, access.sections)))
}

pub(in crate::api::exams) async fn delete_exam(
    Path(exam_id): Path<i64>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<StatusCode, ApiError> {
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let exam = repositories::exams::find_for_update(&mut *tx, exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?;

    let Some(exam) = exam else {
        return Err(ApiError::NotFound("Exam not found".to_string()));
    };

    let actor = Actor::from_user(&user);
    if !actor.is_admin && !actor.owns_exam(&exam) {
        return Err(ApiError::forbidden("Only the exam owner can delete this exam"));
    }
    if exam.is_locked && !actor.is_admin {
        return Err(ApiError::Conflict(
            "Exam is finalized; only an admin can delete it".to_string(),
        ));
    }

    repositories::exams::delete_by_id(&mut *tx, exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete exam"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(exam_id = exam.id, user_id = user.id, action = "delete_exam", "Exam deleted");

    Ok(StatusCode::NO_CONTENT)
}
