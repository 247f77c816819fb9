use crate::db::models::Question;

const COLUMNS: &str = "id, exam_id, label, max_marks, \"order\"";

pub(crate) async fn list_by_exam(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: i64,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE exam_id = $1 ORDER BY \"order\", id"
    ))
    .bind(exam_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn list_for_exams(
    executor: impl sqlx::PgExecutor<'_>,
    exam_ids: &[i64],
) -> Result<Vec<Question>, sqlx::Error> {
    if exam_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE exam_id = ANY($1) ORDER BY exam_id, \"order\", id"
    ))
    .bind(exam_ids)
    .fetch_all(executor)
    .await
}

pub(crate) async fn insert(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: i64,
    label: &str,
    max_marks: f64,
    order: i32,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (exam_id, label, max_marks, \"order\")
         VALUES ($1,$2,$3,$4)
         RETURNING {COLUMNS}"
    ))
    .bind(exam_id)
    .bind(label)
    .bind(max_marks)
    .bind(order)
    .fetch_one(executor)
    .await
}

pub(crate) async fn update(
    executor: impl sqlx::PgExecutor<'_>,
    id: i64,
    max_marks: f64,
    order: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE questions SET max_marks = $1, \"order\" = $2 WHERE id = $3")
        .bind(max_marks)
        .bind(order)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}
