use axum::extract::{Path, Query};
use axum::response::Response;
use axum::Json;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::exports::csv_attachment;
use crate::api::guards::{require_exam_access, CurrentUser};
use crate::core::metrics;
use crate::core::state::AppState;
use crate::repositories;
use crate::repositories::marks_store::PgMarksStore;
use crate::schemas::exam::ExamResponse;
use crate::schemas::marks::{ExamMarksResponse, ExportQuery, SaveMarksRequest, SaveMarksResponse};
use crate::services::access::Actor;
use crate::services::{aggregate, export, reconcile};

pub(in crate::api::exams) async fn save_marks(
    Path(exam_id): Path<i64>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
    Json(payload): Json<SaveMarksRequest>,
) -> Result<Json<SaveMarksResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let submission = payload.into_submission();

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    // The row lock orders this save against a concurrent finalize.
    let exam = repositories::exams::find_for_update(&mut *tx, exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?;

    let Some(exam) = exam else {
        return Err(ApiError::NotFound("Exam not found".to_string()));
    };

    let sections = repositories::sections::list_by_exam(&mut *tx, exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch sections"))?;

    let actor = Actor::from_user(&user);
    let mut store = PgMarksStore::new(tx);
    let summary = reconcile::save_marks(&mut store, &exam, &sections, actor, &submission).await?;
    store.commit().await.map_err(|e| ApiError::internal(e, "Failed to save marks"))?;

    let written = (summary.created_marks + summary.updated_marks) as u64;
    metrics::record_marks_saved(written, summary.skipped_marks as u64);

    tracing::info!(
        exam_id = exam.id,
        user_id = user.id,
        section_id = ?submission.section_id,
        action = "save_marks",
        created_questions = summary.created_questions,
        created_students = summary.created_students,
        created_marks = summary.created_marks,
        updated_marks = summary.updated_marks,
        skipped_marks = summary.skipped_marks,
        "Marks saved"
    );

    Ok(Json(SaveMarksResponse { status: "ok", exam_id: exam.id, summary }))
}

pub(in crate::api::exams) async fn get_marks(
    Path(exam_id): Path<i64>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<ExamMarksResponse>, ApiError> {
    let access = require_exam_access(&state, &user, exam_id).await?;

    let member = aggregate::load_member(state.db(), access.exam)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exam marks"))?;

    Ok(Json(ExamMarksResponse {
        exam: ExamResponse::from_db(member.exam, member.sections),
        questions: member.questions.into_iter().map(Into::into).collect(),
        students: member.students.into_iter().map(Into::into).collect(),
        marks: member.marks.into_iter().map(Into::into).collect(),
    }))
}

pub(in crate::api::exams) async fn export_marks(
    Path(exam_id): Path<i64>,
    Query(params): Query<ExportQuery>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Response, ApiError> {
    let access = require_exam_access(&state, &user, exam_id).await?;

    let group = aggregate::load_single(state.db(), access.exam).await?;
    let table = export::build_table(
        &group,
        export::ExportOptions { group_by_section: params.group_by_section },
    );
    let body = export::render_csv(
        &group.reference,
        &state.settings().export().institution_name,
        &table,
    );

    metrics::record_export("single");
    tracing::info!(
        exam_id = group.reference.id,
        user_id = user.id,
        rows = table.rows.len(),
        action = "export_marks",
        "Exam exported"
    );

    csv_attachment(&export::export_filename(&group.reference), body)
}
