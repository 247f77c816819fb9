use async_trait::async_trait;

use crate::db::models::{Mark, Question, RuleMap, Student};

#[derive(Debug, thiserror::Error)]
pub(crate) enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("marks store unavailable: {0}")]
    Unavailable(String),
}

pub(crate) struct NewMark {
    pub(crate) exam_id: i64,
    pub(crate) student_id: i64,
    pub(crate) question_id: i64,
    pub(crate) section_id: Option<i64>,
    pub(crate) marks: Option<f64>,
}

/// Persistence capabilities the reconciler needs for one exam.
///
/// Implementations are expected to run every call inside a single unit of work; the caller
/// commits only after [`super::save_marks`] returns `Ok`.
#[async_trait]
pub(crate) trait MarksStore: Send {
    async fn list_questions(&mut self, exam_id: i64) -> Result<Vec<Question>, StoreError>;

    async fn insert_question(
        &mut self,
        exam_id: i64,
        label: &str,
        max_marks: f64,
        order: i32,
    ) -> Result<Question, StoreError>;

    async fn update_question(
        &mut self,
        question_id: i64,
        max_marks: f64,
        order: i32,
    ) -> Result<(), StoreError>;

    async fn list_students(&mut self, exam_id: i64) -> Result<Vec<Student>, StoreError>;

    async fn insert_student(
        &mut self,
        exam_id: i64,
        roll_no: i64,
        name: Option<&str>,
        absent: bool,
    ) -> Result<Student, StoreError>;

    async fn update_student(
        &mut self,
        student_id: i64,
        name: Option<&str>,
        absent: bool,
    ) -> Result<(), StoreError>;

    async fn list_marks(&mut self, exam_id: i64) -> Result<Vec<Mark>, StoreError>;

    async fn insert_mark(&mut self, mark: NewMark) -> Result<Mark, StoreError>;

    async fn update_mark(
        &mut self,
        mark_id: i64,
        section_id: Option<i64>,
        marks: Option<f64>,
    ) -> Result<(), StoreError>;

    async fn update_exam_summary(
        &mut self,
        exam_id: i64,
        students_count: i32,
        question_rules: &RuleMap,
    ) -> Result<(), StoreError>;
}
