use crate::db::models::Student;

const COLUMNS: &str = "id, exam_id, roll_no, name, absent";

pub(crate) async fn list_by_exam(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: i64,
) -> Result<Vec<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "SELECT {COLUMNS} FROM students WHERE exam_id = $1 ORDER BY roll_no"
    ))
    .bind(exam_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn list_for_exams(
    executor: impl sqlx::PgExecutor<'_>,
    exam_ids: &[i64],
) -> Result<Vec<Student>, sqlx::Error> {
    if exam_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, Student>(&format!(
        "SELECT {COLUMNS} FROM students WHERE exam_id = ANY($1) ORDER BY exam_id, roll_no"
    ))
    .bind(exam_ids)
    .fetch_all(executor)
    .await
}

pub(crate) async fn insert(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: i64,
    roll_no: i64,
    name: Option<&str>,
    absent: bool,
) -> Result<Student, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "INSERT INTO students (exam_id, roll_no, name, absent)
         VALUES ($1,$2,$3,$4)
         RETURNING {COLUMNS}"
    ))
    .bind(exam_id)
    .bind(roll_no)
    .bind(name)
    .bind(absent)
    .fetch_one(executor)
    .await
}

pub(crate) async fn update(
    executor: impl sqlx::PgExecutor<'_>,
    id: i64,
    name: Option<&str>,
    absent: bool,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE students SET name = $1, absent = $2 WHERE id = $3")
        .bind(name)
        .bind(absent)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}
