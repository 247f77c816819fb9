use std::collections::HashMap;

use axum::{extract::Query, Json};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::db::models::ExamSection;
use crate::repositories;
use crate::schemas::exam::{ExamListQuery, ExamResponse};

pub(in crate::api::exams) async fn list_exams(
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
    Query(params): Query<ExamListQuery>,
) -> Result<Json<Vec<ExamResponse>>, ApiError> {
    let subject_name = non_blank(params.subject_name.as_deref());
    let academic_year = non_blank(params.academic_year.as_deref());

    let exams = repositories::exams::list(
        state.db(),
        repositories::exams::ListExams {
            visible_to: (!user.is_admin()).then_some(user.id),
            subject_name,
            academic_year,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    let exam_ids: Vec<i64> = exams.iter().map(|exam| exam.id).collect();
    let sections = repositories::sections::list_for_exams(state.db(), &exam_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch sections"))?;

    let mut by_exam: HashMap<i64, Vec<ExamSection>> = HashMap::new();
    for section in sections {
        by_exam.entry(section.exam_id).or_default().push(section);
    }

    let items = exams
        .into_iter()
        .map(|exam| {
            let sections = by_exam.remove(&exam.id).unwrap_or_default();
            ExamResponse::from_db(exam, sections)
        })
        .collect();

    Ok(Json(items))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
