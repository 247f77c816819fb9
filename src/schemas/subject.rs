use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::CatalogSubject;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubjectCreate {
    #[validate(length(min = 2, max = 255, message = "programme must be 2-255 characters"))]
    pub(crate) programme: String,
    #[validate(range(min = 1, message = "semester must be at least 1"))]
    pub(crate) semester: i32,
    #[serde(alias = "subjectCode")]
    #[validate(length(min = 2, max = 64, message = "subject_code must be 2-64 characters"))]
    pub(crate) subject_code: String,
    #[serde(alias = "subjectName")]
    #[validate(length(min = 2, max = 255, message = "subject_name must be 2-255 characters"))]
    pub(crate) subject_name: String,
}

/// Catalog row values as they are stored: trimmed, with the subject code upper-cased so
/// that `cs201` and `CS201` collide.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct SubjectEntry {
    pub(crate) programme: String,
    pub(crate) semester: i32,
    pub(crate) subject_code: String,
    pub(crate) subject_name: String,
}

impl SubjectCreate {
    pub(crate) fn entry(&self) -> Result<SubjectEntry, String> {
        let programme = self.programme.trim();
        let subject_code = self.subject_code.trim();
        let subject_name = self.subject_name.trim();

        let fields = [
            ("programme", programme),
            ("subject_code", subject_code),
            ("subject_name", subject_name),
        ];
        for (field, value) in fields {
            if value.chars().count() < 2 {
                return Err(format!("{field} must be at least 2 characters"));
            }
        }

        Ok(SubjectEntry {
            programme: programme.to_string(),
            semester: self.semester,
            subject_code: subject_code.to_uppercase(),
            subject_name: subject_name.to_string(),
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CatalogQuery {
    #[validate(length(min = 1, message = "programme is required"))]
    pub(crate) programme: String,
    #[validate(range(min = 1, message = "semester must be at least 1"))]
    pub(crate) semester: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SemestersQuery {
    #[validate(length(min = 1, message = "programme is required"))]
    pub(crate) programme: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubjectSearchQuery {
    #[validate(length(max = 100, message = "q must be at most 100 characters"))]
    pub(crate) q: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubjectResponse {
    pub(crate) id: i64,
    pub(crate) programme: String,
    pub(crate) semester: i32,
    pub(crate) subject_code: String,
    pub(crate) subject_name: String,
    pub(crate) is_active: bool,
    pub(crate) created_at: String,
}

impl From<CatalogSubject> for SubjectResponse {
    fn from(subject: CatalogSubject) -> Self {
        Self {
            id: subject.id,
            programme: subject.programme,
            semester: subject.semester,
            subject_code: subject.subject_code,
            subject_name: subject.subject_name,
            is_active: subject.is_active,
            created_at: format_primitive(subject.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubjectRemovedResponse {
    pub(crate) status: &'static str,
    pub(crate) message: &'static str,
}
