use crate::db::models::Mark;
use crate::services::reconcile::NewMark;

const COLUMNS: &str = "id, exam_id, student_id, question_id, section_id, marks";

pub(crate) async fn list_by_exam(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: i64,
) -> Result<Vec<Mark>, sqlx::Error> {
    sqlx::query_as::<_, Mark>(&format!(
        "SELECT {COLUMNS} FROM marks WHERE exam_id = $1 ORDER BY id"
    ))
    .bind(exam_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn list_for_exams(
    executor: impl sqlx::PgExecutor<'_>,
    exam_ids: &[i64],
) -> Result<Vec<Mark>, sqlx::Error> {
    if exam_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, Mark>(&format!(
        "SELECT {COLUMNS} FROM marks WHERE exam_id = ANY($1) ORDER BY exam_id, id"
    ))
    .bind(exam_ids)
    .fetch_all(executor)
    .await
}

pub(crate) async fn insert(
    executor: impl sqlx::PgExecutor<'_>,
    mark: &NewMark,
) -> Result<Mark, sqlx::Error> {
    sqlx::query_as::<_, Mark>(&format!(
        "INSERT INTO marks (exam_id, student_id, question_id, section_id, marks)
         VALUES ($1,$2,$3,$4,$5)
         RETURNING {COLUMNS}"
    ))
    .bind(mark.exam_id)
    .bind(mark.student_id)
    .bind(mark.question_id)
    .bind(mark.section_id)
    .bind(mark.marks)
    .fetch_one(executor)
    .await
}

pub(crate) async fn update(
    executor: impl sqlx::PgExecutor<'_>,
    id: i64,
    section_id: Option<i64>,
    marks: Option<f64>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE marks SET section_id = $1, marks = $2 WHERE id = $3")
        .bind(section_id)
        .bind(marks)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}
