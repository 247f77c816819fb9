use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::UserRole;

/// Raw `question_rules` column: main question label to rule object.
pub(crate) type RuleMap = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: i64,
    pub(crate) name: Option<String>,
    pub(crate) email: String,
    pub(crate) role: UserRole,
    pub(crate) is_frozen: bool,
    pub(crate) is_deleted: bool,
    pub(crate) created_at: PrimitiveDateTime,
}

impl User {
    pub(crate) fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Exam {
    pub(crate) id: i64,
    pub(crate) programme: String,
    pub(crate) subject_code: String,
    pub(crate) subject_name: String,
    pub(crate) exam_type: String,
    pub(crate) semester: i32,
    pub(crate) academic_year: String,
    pub(crate) students_count: i32,
    pub(crate) question_rules: Json<RuleMap>,
    pub(crate) created_by: Option<i64>,
    pub(crate) is_locked: bool,
    pub(crate) locked_by: Option<i64>,
    pub(crate) locked_at: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamSection {
    pub(crate) id: i64,
    pub(crate) exam_id: i64,
    pub(crate) section_name: Option<String>,
    pub(crate) roll_start: i64,
    pub(crate) roll_end: i64,
    pub(crate) teacher_id: i64,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub(crate) struct Question {
    pub(crate) id: i64,
    pub(crate) exam_id: i64,
    pub(crate) label: String,
    pub(crate) max_marks: f64,
    pub(crate) order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub(crate) struct Student {
    pub(crate) id: i64,
    pub(crate) exam_id: i64,
    pub(crate) roll_no: i64,
    pub(crate) name: Option<String>,
    pub(crate) absent: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub(crate) struct Mark {
    pub(crate) id: i64,
    pub(crate) exam_id: i64,
    pub(crate) student_id: i64,
    pub(crate) question_id: i64,
    pub(crate) section_id: Option<i64>,
    pub(crate) marks: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub(crate) struct CatalogSubject {
    pub(crate) id: i64,
    pub(crate) programme: String,
    pub(crate) semester: i32,
    pub(crate) subject_code: String,
    pub(crate) subject_name: String,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
}
