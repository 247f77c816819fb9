use axum::http::StatusCode;
use axum::Json;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::exam::{ExamCreate, ExamResponse};

/// Creating the same exam twice hands back the first row with 200 instead of 201.
pub(in crate::api::exams) async fn create_exam(
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
    Json(payload): Json<ExamCreate>,
) -> Result<(StatusCode, Json<ExamResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let key = payload.logical_key();

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let existing = repositories::exams::find_owned_by_key(&mut *tx, user.id, &key)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?;

    if let Some(exam) = existing {
        tx.rollback().await.map_err(|e| ApiError::internal(e, "Failed to end transaction"))?;
        let sections = repositories::sections::list_by_exam(state.db(), exam.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch sections"))?;
        return Ok((StatusCode::OK, Json(ExamResponse::from_db(exam, sections))));
    }

    let exam = repositories::exams::create(
        &mut *tx,
        repositories::exams::CreateExam {
            programme: &key.programme,
            subject_code: &key.subject_code,
            subject_name: &key.subject_name,
            exam_type: &key.exam_type,
            semester: key.semester,
            academic_year: &key.academic_year,
            created_by: user.id,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create exam"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(
        exam_id = exam.id,
        user_id = user.id,
        subject_code = %exam.subject_code,
        action = "create_exam",
        "Exam created"
    );

    Ok((StatusCode::CREATED, Json(ExamResponse::from_db(exam, Vec::new()))))
}
