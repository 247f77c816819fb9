use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};
use crate::db::models::{Exam, ExamSection, User};
use crate::repositories;
use crate::services::access::Actor;

pub(crate) struct CurrentUser(pub(crate) User);
pub(crate) struct CurrentAdmin(pub(crate) User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let user_id = security::verify_token(token, app_state.settings())
            .and_then(|claims| claims.user_id())
            .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

        let user = repositories::users::find_by_id(app_state.db(), user_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load user"))?;

        let Some(user) = user else {
            return Err(ApiError::Unauthorized("User not found"));
        };

        if user.is_frozen || user.is_deleted {
            return Err(ApiError::Unauthorized("Invalid authentication credentials"));
        }

        Ok(CurrentUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if user.is_admin() {
            Ok(CurrentAdmin(user))
        } else {
            Err(ApiError::forbidden("Admin access required"))
        }
    }
}

/// An exam together with its sections, once the caller is known to be allowed to see it.
pub(crate) struct ExamAccess {
    pub(crate) exam: Exam,
    pub(crate) sections: Vec<ExamSection>,
    pub(crate) actor: Actor,
}

pub(crate) async fn require_exam_access(
    state: &AppState,
    user: &User,
    exam_id: i64,
) -> Result<ExamAccess, ApiError> {
    let exam = repositories::exams::find_by_id(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?;

    let Some(exam) = exam else {
        return Err(ApiError::NotFound("Exam not found".to_string()));
    };

    let sections = repositories::sections::list_by_exam(state.db(), exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch sections"))?;

    let actor = Actor::from_user(user);
    if !actor.can_view(&exam, &sections) {
        return Err(ApiError::forbidden("Not enough permissions for this exam"));
    }

    Ok(ExamAccess { exam, sections, actor })
}
