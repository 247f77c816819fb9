use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::db::models::{Mark, Question, RuleMap, Student};
use crate::schemas::exam::ExamResponse;
use crate::services::aggregate::{MergedMark, MergedQuestion, MergedStudent};
use crate::services::reconcile::{
    MarksSubmission, QuestionInput, SaveMarksSummary, StudentInput,
};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionPayload {
    #[validate(length(min = 1, max = 64, message = "label must be 1-64 characters"))]
    pub(crate) label: String,
    #[serde(alias = "maxMarks")]
    #[validate(range(min = 0.0, message = "max_marks must be non-negative"))]
    pub(crate) max_marks: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct StudentPayload {
    #[serde(alias = "rollNo", deserialize_with = "deserialize_roll_no")]
    #[validate(range(min = 0, message = "roll_no must be non-negative"))]
    pub(crate) roll_no: i64,
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) absent: bool,
    /// Values stay raw here; the reconciler reports which roll/label failed to parse.
    #[serde(default)]
    pub(crate) marks: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SaveMarksRequest {
    #[serde(default)]
    #[serde(alias = "sectionId")]
    pub(crate) section_id: Option<i64>,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) questions: Vec<QuestionPayload>,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) students: Vec<StudentPayload>,
    #[serde(default)]
    #[serde(alias = "questionRules")]
    pub(crate) question_rules: Option<RuleMap>,
}

impl SaveMarksRequest {
    pub(crate) fn into_submission(self) -> MarksSubmission {
        MarksSubmission {
            section_id: self.section_id,
            questions: self
                .questions
                .into_iter()
                .map(|question| QuestionInput {
                    label: question.label.trim().to_string(),
                    max_marks: question.max_marks,
                })
                .collect(),
            students: self
                .students
                .into_iter()
                .map(|student| StudentInput {
                    roll_no: student.roll_no,
                    name: student.name,
                    absent: student.absent,
                    marks: student
                        .marks
                        .into_iter()
                        .map(|(label, value)| (label.trim().to_string(), value))
                        .collect(),
                })
                .collect(),
            question_rules: self.question_rules,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SaveMarksResponse {
    pub(crate) status: &'static str,
    pub(crate) exam_id: i64,
    #[serde(flatten)]
    pub(crate) summary: SaveMarksSummary,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: i64,
    pub(crate) label: String,
    pub(crate) max_marks: f64,
    pub(crate) order: i32,
}

impl From<Question> for QuestionResponse {
    fn from(question: Question) -> Self {
        Self {
            id: question.id,
            label: question.label,
            max_marks: question.max_marks,
            order: question.order,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentResponse {
    pub(crate) id: i64,
    pub(crate) roll_no: i64,
    pub(crate) name: Option<String>,
    pub(crate) absent: bool,
}

impl From<Student> for StudentResponse {
    fn from(student: Student) -> Self {
        Self {
            id: student.id,
            roll_no: student.roll_no,
            name: student.name,
            absent: student.absent,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct MarkResponse {
    pub(crate) student_id: i64,
    pub(crate) question_id: i64,
    pub(crate) section_id: Option<i64>,
    pub(crate) marks: Option<f64>,
}

impl From<Mark> for MarkResponse {
    fn from(mark: Mark) -> Self {
        Self {
            student_id: mark.student_id,
            question_id: mark.question_id,
            section_id: mark.section_id,
            marks: mark.marks,
        }
    }
}

/// Single exam: rows keep their database ids.
#[derive(Debug, Serialize)]
pub(crate) struct ExamMarksResponse {
    pub(crate) exam: ExamResponse,
    pub(crate) questions: Vec<QuestionResponse>,
    pub(crate) students: Vec<StudentResponse>,
    pub(crate) marks: Vec<MarkResponse>,
}

/// Logical group: students are keyed by roll number and marks by `(roll_no, label)`.
#[derive(Debug, Serialize)]
pub(crate) struct CombinedMarksResponse {
    pub(crate) exam: ExamResponse,
    pub(crate) member_exam_ids: Vec<i64>,
    pub(crate) question_rules: RuleMap,
    pub(crate) questions: Vec<MergedQuestion>,
    pub(crate) students: Vec<MergedStudent>,
    pub(crate) marks: Vec<MergedMark>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ExportQuery {
    #[serde(default)]
    pub(crate) group_by_section: bool,
}

fn deserialize_roll_no<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(number) => {
            number.as_i64().ok_or_else(|| D::Error::custom(format!("invalid roll_no: {number}")))
        }
        Value::String(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| D::Error::custom(format!("invalid roll_no: {raw}"))),
        other => Err(D::Error::custom(format!("invalid roll_no: {other}"))),
    }
}
