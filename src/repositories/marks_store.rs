use async_trait::async_trait;
use sqlx::{Postgres, Transaction};

use crate::core::time::primitive_now_utc;
use crate::db::models::{Mark, Question, RuleMap, Student};
use crate::repositories::{exams, marks, questions, students};
use crate::services::reconcile::{MarksStore, NewMark, StoreError};

/// [`MarksStore`] over one open transaction. Dropping it without [`PgMarksStore::commit`]
/// rolls every write back.
pub(crate) struct PgMarksStore<'c> {
    tx: Transaction<'c, Postgres>,
}

impl<'c> PgMarksStore<'c> {
    pub(crate) fn new(tx: Transaction<'c, Postgres>) -> Self {
        Self { tx }
    }

    pub(crate) async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }
}

#[async_trait]
impl MarksStore for PgMarksStore<'_> {
    async fn list_questions(&mut self, exam_id: i64) -> Result<Vec<Question>, StoreError> {
        Ok(questions::list_by_exam(&mut *self.tx, exam_id).await?)
    }

    async fn insert_question(
        &mut self,
        exam_id: i64,
        label: &str,
        max_marks: f64,
        order: i32,
    ) -> Result<Question, StoreError> {
        Ok(questions::insert(&mut *self.tx, exam_id, label, max_marks, order).await?)
    }

    async fn update_question(
        &mut self,
        question_id: i64,
        max_marks: f64,
        order: i32,
    ) -> Result<(), StoreError> {
        Ok(questions::update(&mut *self.tx, question_id, max_marks, order).await?)
    }

    async fn list_students(&mut self, exam_id: i64) -> Result<Vec<Student>, StoreError> {
        Ok(students::list_by_exam(&mut *self.tx, exam_id).await?)
    }

    async fn insert_student(
        &mut self,
        exam_id: i64,
        roll_no: i64,
        name: Option<&str>,
        absent: bool,
    ) -> Result<Student, StoreError> {
        Ok(students::insert(&mut *self.tx, exam_id, roll_no, name, absent).await?)
    }

    async fn update_student(
        &mut self,
        student_id: i64,
        name: Option<&str>,
        absent: bool,
    ) -> Result<(), StoreError> {
        Ok(students::update(&mut *self.tx, student_id, name, absent).await?)
    }

    async fn list_marks(&mut self, exam_id: i64) -> Result<Vec<Mark>, StoreError> {
        Ok(marks::list_by_exam(&mut *self.tx, exam_id).await?)
    }

    async fn insert_mark(&mut self, mark: NewMark) -> Result<Mark, StoreError> {
        Ok(marks::insert(&mut *self.tx, &mark).await?)
    }

    async fn update_mark(
        &mut self,
        mark_id: i64,
        section_id: Option<i64>,
        marks: Option<f64>,
    ) -> Result<(), StoreError> {
        Ok(marks::update(&mut *self.tx, mark_id, section_id, marks).await?)
    }

    async fn update_exam_summary(
        &mut self,
        exam_id: i64,
        students_count: i32,
        question_rules: &RuleMap,
    ) -> Result<(), StoreError> {
        let now = primitive_now_utc();
        Ok(exams::update_summary(&mut *self.tx, exam_id, students_count, question_rules, now)
            .await?)
    }
}
