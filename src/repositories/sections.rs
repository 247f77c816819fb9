use time::PrimitiveDateTime;

use crate::db::models::ExamSection;

const COLUMNS: &str = "id, exam_id, section_name, roll_start, roll_end, teacher_id, created_at";

pub(crate) async fn list_by_exam(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: i64,
) -> Result<Vec<ExamSection>, sqlx::Error> {
    sqlx::query_as::<_, ExamSection>(&format!(
        "SELECT {COLUMNS} FROM exam_sections WHERE exam_id = $1 ORDER BY roll_start, id"
    ))
    .bind(exam_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn list_for_exams(
    executor: impl sqlx::PgExecutor<'_>,
    exam_ids: &[i64],
) -> Result<Vec<ExamSection>, sqlx::Error> {
    if exam_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, ExamSection>(&format!(
        "SELECT {COLUMNS} FROM exam_sections WHERE exam_id = ANY($1) ORDER BY roll_start, id"
    ))
    .bind(exam_ids)
    .fetch_all(executor)
    .await
}

pub(crate) async fn find_in_exam(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: i64,
    section_id: i64,
) -> Result<Option<ExamSection>, sqlx::Error> {
    sqlx::query_as::<_, ExamSection>(&format!(
        "SELECT {COLUMNS} FROM exam_sections WHERE exam_id = $1 AND id = $2"
    ))
    .bind(exam_id)
    .bind(section_id)
    .fetch_optional(executor)
    .await
}

pub(crate) struct CreateSection<'a> {
    pub(crate) exam_id: i64,
    pub(crate) section_name: Option<&'a str>,
    pub(crate) roll_start: i64,
    pub(crate) roll_end: i64,
    pub(crate) teacher_id: i64,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateSection<'_>,
) -> Result<ExamSection, sqlx::Error> {
    sqlx::query_as::<_, ExamSection>(&format!(
        "INSERT INTO exam_sections (
            exam_id, section_name, roll_start, roll_end, teacher_id, created_at
         )
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {COLUMNS}"
    ))
    .bind(params.exam_id)
    .bind(params.section_name)
    .bind(params.roll_start)
    .bind(params.roll_end)
    .bind(params.teacher_id)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn delete_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM exam_sections WHERE id = $1").bind(id).execute(executor).await?;
    Ok(())
}
