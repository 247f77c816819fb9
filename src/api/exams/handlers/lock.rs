use axum::extract::{Path, Query};
use axum::Json;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::repositories;
use crate::schemas::exam::{LockQuery, LockResponse};
use crate::services::access::Actor;
use crate::services::aggregate::LogicalExamKey;
use crate::services::exam_lock::{self, LockAction, LockError, LockScope};

pub(in crate::api::exams) async fn finalize_exam(
    Path(exam_id): Path<i64>,
    Query(params): Query<LockQuery>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<LockResponse>, ApiError> {
    transition(&state, &user, exam_id, LockAction::Finalize, params.scope).await.map(Json)
}

pub(in crate::api::exams) async fn unfinalize_exam(
    Path(exam_id): Path<i64>,
    Query(params): Query<LockQuery>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<LockResponse>, ApiError> {
    transition(&state, &user, exam_id, LockAction::Unfinalize, params.scope).await.map(Json)
}

async fn transition(
    state: &AppState,
    user: &User,
    exam_id: i64,
    action: LockAction,
    scope: LockScope,
) -> Result<LockResponse, ApiError> {
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

    let sections = repositories::sections::list_by_exam(&mut *tx, exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch sections"))?;

    let actor = Actor::from_user(user);
    if !exam_lock::may_transition(&actor, &exam, &sections, action, scope) {
        return Err(ApiError::forbidden(match (action, scope) {
            (LockAction::Finalize, LockScope::Single) => {
                "Only the exam owner, a section teacher or an admin can finalize this exam"
            }
            _ => "Admin access required",
        }));
    }

    let targets = match scope {
        LockScope::Single => {
            exam_lock::check_transition(&exam, action)?;
            vec![exam.id]
        }
        LockScope::Global => {
            let members =
                repositories::exams::list_by_logical_key(&mut *tx, &LogicalExamKey::of(&exam))
                    .await
                    .map_err(|e| ApiError::internal(e, "Failed to fetch exam group"))?;
            exam_lock::pending_members(&members, action)
        }
    };

    let now = primitive_now_utc();
    let changed = match action {
        LockAction::Finalize => repositories::exams::lock(&mut *tx, &targets, user.id, now).await,
        LockAction::Unfinalize => repositories::exams::unlock(&mut *tx, &targets, now).await,
    }
    .map_err(|e| ApiError::internal(e, "Failed to update exam lock"))?;

    if scope == LockScope::Single && changed.is_empty() {
        let err = match action {
            LockAction::Finalize => LockError::AlreadyLocked(exam.id),
            LockAction::Unfinalize => LockError::NotLocked(exam.id),
        };
        return Err(err.into());
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    metrics::record_lock_transition(action.as_str(), scope.as_str(), changed.len());
    tracing::info!(
        exam_id = exam.id,
        user_id = user.id,
        action = action.as_str(),
        scope = scope.as_str(),
        changed = ?changed,
        "Exam lock state changed"
    );

    Ok(LockResponse {
        status: "ok",
        scope,
        is_locked: action.target_locked(),
        exam_ids: changed,
    })
}
