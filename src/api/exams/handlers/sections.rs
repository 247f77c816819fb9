use axum::extract::Path;
use axum::http::StatusCode;
use axum::Json;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_exam_access, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::section::{SectionCreate, SectionResponse};
use crate::services::access::Actor;
use crate::services::{exam_lock, sections};

pub(in crate::api::exams) async fn create_section(
    Path(exam_id): Path<i64>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
    Json(payload): Json<SectionCreate>,
) -> Result<(StatusCode, Json<SectionResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    sections::validate_range(payload.roll_start, payload.roll_end)?;

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    // Holding the exam row keeps concurrent section inserts from racing the overlap check.
    let exam = repositories::exams::find_for_update(&mut *tx, exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?;

    let Some(exam) = exam else {
        return Err(ApiError::NotFound("Exam not found".to_string()));
    };

    let actor = Actor::from_user(&user);
    let manages_exam = actor.is_admin || actor.owns_exam(&exam);
    let teacher_id = payload.teacher_id.unwrap_or(user.id);
    if teacher_id != user.id && !manages_exam {
        return Err(ApiError::forbidden(
            "Only the exam owner can assign a section to another teacher",
        ));
    }
    exam_lock::ensure_unlocked(&exam)?;

    if teacher_id != user.id {
        let teacher = repositories::users::find_by_id(&mut *tx, teacher_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch teacher"))?;
        if teacher.is_none() {
            return Err(ApiError::NotFound(format!("Teacher {teacher_id} not found")));
        }
    }

    let existing = repositories::sections::list_by_exam(&mut *tx, exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch sections"))?;
    sections::check_new_range(&existing, payload.roll_start, payload.roll_end)?;

    let section_name = payload.section_name.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let section = repositories::sections::create(
        &mut *tx,
        repositories::sections::CreateSection {
            exam_id: exam.id,
            section_name,
            roll_start: payload.roll_start,
            roll_end: payload.roll_end,
            teacher_id,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create section"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(
        exam_id = exam.id,
        section_id = section.id,
        user_id = user.id,
        teacher_id,
        roll_start = section.roll_start,
        roll_end = section.roll_end,
        action = "create_section",
        "Section created"
    );

    Ok((StatusCode::CREATED, Json(SectionResponse::from_db(section))))
}

pub(in crate::api::exams) async fn list_sections(
    Path(exam_id): Path<i64>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<SectionResponse>>, ApiError> {
    let access = require_exam_access(&state, &user, exam_id).await?;
    Ok(Json(access.sections.into_iter().map(SectionResponse::from_db).collect()))
}

pub(in crate::api::exams) async fn delete_section(
    Path((exam_id, section_id)): Path<(i64, i64)>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<StatusCode, ApiError> {
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    // Deleting a section detaches its marks, so it must not interleave with a finalize.
    let exam = repositories::exams::find_for_update(&mut *tx, exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?;

    let Some(exam) = exam else {
        return Err(ApiError::NotFound("Exam not found".to_string()));
    };

    let section = repositories::sections::find_in_exam(&mut *tx, exam.id, section_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch section"))?;

    let Some(section) = section else {
        return Err(ApiError::NotFound("Section not found".to_string()));
    };

    let actor = Actor::from_user(&user);
    if !actor.is_admin && !actor.owns_exam(&exam) && !actor.owns_section(&section) {
        return Err(ApiError::forbidden("Not enough permissions for this section"));
    }
    exam_lock::ensure_unlocked(&exam)?;

    repositories::sections::delete_by_id(&mut *tx, section.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete section"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(
        exam_id = exam.id,
        section_id = section.id,
        user_id = user.id,
        action = "delete_section",
        "Section deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}
