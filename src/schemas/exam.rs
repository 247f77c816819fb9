use serde::{Deserialize, Serialize};
use validator::Validate;

pub(crate) use crate::core::time::format_primitive;
use crate::db::models::{Exam, ExamSection, RuleMap};
use crate::schemas::section::SectionResponse;
use crate::services::aggregate::LogicalExamKey;
use crate::services::exam_lock::LockScope;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamCreate {
    #[validate(length(min = 1, max = 255, message = "programme must not be empty"))]
    pub(crate) programme: String,
    #[serde(alias = "subjectCode")]
    #[validate(length(min = 1, max = 64, message = "subject_code must not be empty"))]
    pub(crate) subject_code: String,
    #[serde(alias = "subjectName")]
    #[validate(length(min = 1, max = 255, message = "subject_name must not be empty"))]
    pub(crate) subject_name: String,
    #[serde(alias = "examType")]
    #[validate(length(min = 1, max = 64, message = "exam_type must not be empty"))]
    pub(crate) exam_type: String,
    #[validate(range(min = 1, message = "semester must be at least 1"))]
    pub(crate) semester: i32,
    #[serde(alias = "academicYear")]
    #[validate(length(min = 1, max = 32, message = "academic_year must not be empty"))]
    pub(crate) academic_year: String,
}

impl ExamCreate {
    /// Fields are trimmed; case is kept as entered.
    pub(crate) fn logical_key(&self) -> LogicalExamKey {
        LogicalExamKey {
            programme: self.programme.trim().to_string(),
            subject_code: self.subject_code.trim().to_string(),
            subject_name: self.subject_name.trim().to_string(),
            exam_type: self.exam_type.trim().to_string(),
            semester: self.semester,
            academic_year: self.academic_year.trim().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExamListQuery {
    #[serde(default)]
    pub(crate) subject_name: Option<String>,
    #[serde(default)]
    pub(crate) academic_year: Option<String>,
}

/// Query string form of [`LogicalExamKey`] for the combined admin surfaces.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LogicalKeyQuery {
    #[validate(length(min = 1, message = "programme is required"))]
    pub(crate) programme: String,
    #[validate(length(min = 1, message = "subject_code is required"))]
    pub(crate) subject_code: String,
    #[validate(length(min = 1, message = "subject_name is required"))]
    pub(crate) subject_name: String,
    #[validate(length(min = 1, message = "exam_type is required"))]
    pub(crate) exam_type: String,
    #[validate(range(min = 1, message = "semester must be at least 1"))]
    pub(crate) semester: i32,
    #[validate(length(min = 1, message = "academic_year is required"))]
    pub(crate) academic_year: String,
    #[serde(default)]
    pub(crate) group_by_section: bool,
}

impl LogicalKeyQuery {
    pub(crate) fn key(&self) -> LogicalExamKey {
        LogicalExamKey {
            programme: self.programme.clone(),
            subject_code: self.subject_code.clone(),
            subject_name: self.subject_name.clone(),
            exam_type: self.exam_type.clone(),
            semester: self.semester,
            academic_year: self.academic_year.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamResponse {
    pub(crate) id: i64,
    pub(crate) programme: String,
    pub(crate) subject_code: String,
    pub(crate) subject_name: String,
    pub(crate) exam_type: String,
    pub(crate) semester: i32,
    pub(crate) academic_year: String,
    pub(crate) students_count: i32,
    pub(crate) question_rules: RuleMap,
    pub(crate) created_by: Option<i64>,
    pub(crate) is_locked: bool,
    pub(crate) locked_by: Option<i64>,
    pub(crate) locked_at: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
    pub(crate) sections: Vec<SectionResponse>,
}

impl ExamResponse {
    pub(crate) fn from_db(exam: Exam, sections: Vec<ExamSection>) -> Self {
        Self {
            id: exam.id,
            programme: exam.programme,
            subject_code: exam.subject_code,
            subject_name: exam.subject_name,
            exam_type: exam.exam_type,
            semester: exam.semester,
            academic_year: exam.academic_year,
            students_count: exam.students_count,
            question_rules: exam.question_rules.0,
            created_by: exam.created_by,
            is_locked: exam.is_locked,
            locked_by: exam.locked_by,
            locked_at: exam.locked_at.map(format_primitive),
            created_at: format_primitive(exam.created_at),
            updated_at: format_primitive(exam.updated_at),
            sections: sections.into_iter().map(SectionResponse::from_db).collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LockQuery {
    #[serde(default)]
    pub(crate) scope: LockScope,
}

#[derive(Debug, Serialize)]
pub(crate) struct LockResponse {
    pub(crate) status: &'static str,
    pub(crate) scope: LockScope,
    pub(crate) is_locked: bool,
    pub(crate) exam_ids: Vec<i64>,
}
