use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::ExamSection;
use crate::services::sections;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SectionCreate {
    #[serde(default)]
    #[serde(alias = "sectionName")]
    #[validate(length(max = 64, message = "section_name must be at most 64 characters"))]
    pub(crate) section_name: Option<String>,
    #[serde(alias = "rollStart")]
    #[validate(range(min = 0, message = "roll_start must be non-negative"))]
    pub(crate) roll_start: i64,
    #[serde(alias = "rollEnd")]
    #[validate(range(min = 0, message = "roll_end must be non-negative"))]
    pub(crate) roll_end: i64,
    #[serde(default)]
    #[serde(alias = "teacherId")]
    pub(crate) teacher_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SectionResponse {
    pub(crate) id: i64,
    pub(crate) exam_id: i64,
    pub(crate) section_name: Option<String>,
    pub(crate) display_name: String,
    pub(crate) roll_start: i64,
    pub(crate) roll_end: i64,
    pub(crate) teacher_id: i64,
    pub(crate) created_at: String,
}

impl SectionResponse {
    pub(crate) fn from_db(section: ExamSection) -> Self {
        Self {
            display_name: sections::display_name(&section),
            id: section.id,
            exam_id: section.exam_id,
            section_name: section.section_name,
            roll_start: section.roll_start,
            roll_end: section.roll_end,
            teacher_id: section.teacher_id,
            created_at: format_primitive(section.created_at),
        }
    }
}
