use axum::extract::Query;
use axum::response::Response;
use axum::Json;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::exports::csv_attachment;
use crate::api::guards::CurrentAdmin;
use crate::core::metrics;
use crate::core::state::AppState;
use crate::schemas::exam::{ExamResponse, LogicalKeyQuery};
use crate::schemas::marks::CombinedMarksResponse;
use crate::services::{aggregate, export};

pub(super) async fn combined_marks(
    Query(params): Query<LogicalKeyQuery>,
    CurrentAdmin(admin): CurrentAdmin,
    state: axum::extract::State<AppState>,
) -> Result<Json<CombinedMarksResponse>, ApiError> {
    params.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let group = aggregate::load_group(state.db(), &params.key()).await?;

    tracing::debug!(
        user_id = admin.id,
        members = ?group.member_ids,
        students = group.students.len(),
        "Combined marks loaded"
    );

    Ok(Json(CombinedMarksResponse {
        exam: ExamResponse::from_db(group.reference, group.sections),
        member_exam_ids: group.member_ids,
        question_rules: group.rules,
        questions: group.questions,
        students: group.students,
        marks: group.marks,
    }))
}

pub(super) async fn combined_export(
    Query(params): Query<LogicalKeyQuery>,
    CurrentAdmin(admin): CurrentAdmin,
    state: axum::extract::State<AppState>,
) -> Result<Response, ApiError> {
    params.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let group = aggregate::load_group(state.db(), &params.key()).await?;
    let table = export::build_table(
        &group,
        export::ExportOptions { group_by_section: params.group_by_section },
    );
    let body = export::render_csv(
        &group.reference,
        &state.settings().export().institution_name,
        &table,
    );

    metrics::record_export("combined");
    tracing::info!(
        user_id = admin.id,
        members = ?group.member_ids,
        rows = table.rows.len(),
        action = "combined_export",
        "Combined exam exported"
    );

    csv_attachment(&export::export_filename(&group.reference), body)
}
