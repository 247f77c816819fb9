use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::Json;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::subject::{
    CatalogQuery, SemestersQuery, SubjectCreate, SubjectRemovedResponse, SubjectResponse,
    SubjectSearchQuery,
};

const SEARCH_LIMIT: i64 = 20;
const DUPLICATE_SUBJECT: &str = "Subject already exists for this programme and semester";

pub(super) async fn list_catalog(
    Query(params): Query<CatalogQuery>,
    CurrentUser(_user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<SubjectResponse>>, ApiError> {
    params.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let subjects =
        repositories::subjects::list_active(state.db(), params.programme.trim(), params.semester)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch subjects"))?;

    Ok(Json(subjects.into_iter().map(Into::into).collect()))
}

pub(super) async fn list_programmes(
    CurrentUser(_user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<String>>, ApiError> {
    let programmes = repositories::subjects::list_programmes(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch programmes"))?;
    Ok(Json(programmes))
}

pub(super) async fn list_valid_semesters(
    Query(params): Query<SemestersQuery>,
    CurrentUser(_user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<i32>>, ApiError> {
    params.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let semesters = repositories::subjects::list_semesters(state.db(), params.programme.trim())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch semesters"))?;
    Ok(Json(semesters))
}

pub(super) async fn add_subject(
    CurrentAdmin(admin): CurrentAdmin,
    state: axum::extract::State<AppState>,
    Json(payload): Json<SubjectCreate>,
) -> Result<(StatusCode, Json<SubjectResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let entry = payload.entry().map_err(ApiError::BadRequest)?;

    let exists = repositories::subjects::active_exists(
        state.db(),
        &entry.programme,
        entry.semester,
        &entry.subject_code,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to check subject catalog"))?;
    if exists {
        return Err(ApiError::BadRequest(DUPLICATE_SUBJECT.to_string()));
    }

    let subject = repositories::subjects::create(
        state.db(),
        repositories::subjects::CreateSubject {
            programme: &entry.programme,
            semester: entry.semester,
            subject_code: &entry.subject_code,
            subject_name: &entry.subject_name,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        // A concurrent insert of the same entry loses on the partial unique index.
        if violates_active_index(&e) {
            ApiError::BadRequest(DUPLICATE_SUBJECT.to_string())
        } else {
            ApiError::internal(e, "Failed to add subject")
        }
    })?;

    tracing::info!(
        subject_id = subject.id,
        user_id = admin.id,
        programme = %subject.programme,
        semester = subject.semester,
        subject_code = %subject.subject_code,
        action = "add_subject",
        "Subject added to catalog"
    );

    Ok((StatusCode::CREATED, Json(subject.into())))
}

pub(super) async fn deactivate_subject(
    Path(subject_id): Path<i64>,
    CurrentAdmin(admin): CurrentAdmin,
    state: axum::extract::State<AppState>,
) -> Result<Json<SubjectRemovedResponse>, ApiError> {
    let subject = repositories::subjects::find_by_id(state.db(), subject_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch subject"))?;

    let Some(subject) = subject else {
        return Err(ApiError::NotFound("Subject not found".to_string()));
    };

    let deactivated = repositories::subjects::deactivate(state.db(), subject.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to remove subject"))?;
    if !deactivated {
        return Err(ApiError::BadRequest("Subject already inactive".to_string()));
    }

    tracing::info!(
        subject_id = subject.id,
        user_id = admin.id,
        action = "deactivate_subject",
        "Subject removed from catalog"
    );

    Ok(Json(SubjectRemovedResponse { status: "ok", message: "Subject removed from catalog" }))
}

pub(super) async fn search_subjects(
    Query(params): Query<SubjectSearchQuery>,
    CurrentAdmin(_admin): CurrentAdmin,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<SubjectResponse>>, ApiError> {
    params.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let subjects =
        repositories::subjects::search_active(state.db(), params.q.trim(), SEARCH_LIMIT)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to search subjects"))?;

    Ok(Json(subjects.into_iter().map(Into::into).collect()))
}

fn violates_active_index(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.constraint())
        .is_some_and(|name| name == repositories::subjects::ACTIVE_UNIQUE_INDEX)
}
