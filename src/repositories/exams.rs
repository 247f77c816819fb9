use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::{Exam, RuleMap};
use crate::services::aggregate::LogicalExamKey;

pub(crate) const COLUMNS: &str = "\
    id, programme, subject_code, subject_name, exam_type, semester, academic_year, \
    students_count, question_rules, created_by, is_locked, locked_by, locked_at, \
    created_at, updated_at";

const LOGICAL_KEY_FILTER: &str = "\
    programme = $1 AND subject_code = $2 AND subject_name = $3 \
    AND exam_type = $4 AND semester = $5 AND academic_year = $6";

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: i64,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Row lock for the rest of the transaction; serializes section creation per exam.
pub(crate) async fn find_for_update(
    executor: impl sqlx::PgExecutor<'_>,
    id: i64,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams WHERE id = $1 FOR UPDATE"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn find_owned_by_key(
    executor: impl sqlx::PgExecutor<'_>,
    owner_id: i64,
    key: &LogicalExamKey,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "SELECT {COLUMNS} FROM exams WHERE {LOGICAL_KEY_FILTER} AND created_by = $7
         ORDER BY id LIMIT 1"
    ))
    .bind(&key.programme)
    .bind(&key.subject_code)
    .bind(&key.subject_name)
    .bind(&key.exam_type)
    .bind(key.semester)
    .bind(&key.academic_year)
    .bind(owner_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn list_by_logical_key(
    executor: impl sqlx::PgExecutor<'_>,
    key: &LogicalExamKey,
) -> Result<Vec<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "SELECT {COLUMNS} FROM exams WHERE {LOGICAL_KEY_FILTER} ORDER BY id"
    ))
    .bind(&key.programme)
    .bind(&key.subject_code)
    .bind(&key.subject_name)
    .bind(&key.exam_type)
    .bind(key.semester)
    .bind(&key.academic_year)
    .fetch_all(executor)
    .await
}

pub(crate) struct CreateExam<'a> {
    pub(crate) programme: &'a str,
    pub(crate) subject_code: &'a str,
    pub(crate) subject_name: &'a str,
    pub(crate) exam_type: &'a str,
    pub(crate) semester: i32,
    pub(crate) academic_year: &'a str,
    pub(crate) created_by: i64,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateExam<'_>,
) -> Result<Exam, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "INSERT INTO exams (
            programme, subject_code, subject_name, exam_type, semester, academic_year,
            students_count, question_rules, created_by, is_locked, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,0,'{{}}'::jsonb,$7,FALSE,$8,$9)
         RETURNING {COLUMNS}"
    ))
    .bind(params.programme)
    .bind(params.subject_code)
    .bind(params.subject_name)
    .bind(params.exam_type)
    .bind(params.semester)
    .bind(params.academic_year)
    .bind(params.created_by)
    .bind(params.now)
    .bind(params.now)
    .fetch_one(executor)
    .await
}

pub(crate) struct ListExams<'a> {
    /// `None` lists every exam (admin view).
    pub(crate) visible_to: Option<i64>,
    pub(crate) subject_name: Option<&'a str>,
    pub(crate) academic_year: Option<&'a str>,
}

pub(crate) async fn list(
    executor: impl sqlx::PgExecutor<'_>,
    params: ListExams<'_>,
) -> Result<Vec<Exam>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM exams WHERE TRUE"));

    if let Some(user_id) = params.visible_to {
        builder.push(" AND (created_by = ");
        builder.push_bind(user_id);
        builder.push(
            " OR EXISTS (SELECT 1 FROM exam_sections s \
             WHERE s.exam_id = exams.id AND s.teacher_id = ",
        );
        builder.push_bind(user_id);
        builder.push("))");
    }

    if let Some(subject_name) = params.subject_name {
        builder.push(" AND subject_name ILIKE ");
        builder.push_bind(format!("%{subject_name}%"));
    }

    if let Some(academic_year) = params.academic_year {
        builder.push(" AND academic_year ILIKE ");
        builder.push_bind(format!("%{academic_year}%"));
    }

    builder.push(" ORDER BY created_at DESC, id DESC");

    builder.build_query_as::<Exam>().fetch_all(executor).await
}

pub(crate) async fn delete_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM exams WHERE id = $1").bind(id).execute(executor).await?;
    Ok(())
}

pub(crate) async fn update_summary(
    executor: impl sqlx::PgExecutor<'_>,
    id: i64,
    students_count: i32,
    question_rules: &RuleMap,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE exams SET students_count = $1, question_rules = $2, updated_at = $3 WHERE id = $4",
    )
    .bind(students_count)
    .bind(Json(question_rules))
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Locks the given exams that are still unlocked and returns the ids that changed.
pub(crate) async fn lock(
    executor: impl sqlx::PgExecutor<'_>,
    ids: &[i64],
    locked_by: i64,
    now: PrimitiveDateTime,
) -> Result<Vec<i64>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_scalar::<_, i64>(
        "UPDATE exams SET is_locked = TRUE, locked_by = $1, locked_at = $2, updated_at = $2
         WHERE id = ANY($3) AND is_locked = FALSE
         RETURNING id",
    )
    .bind(locked_by)
    .bind(now)
    .bind(ids)
    .fetch_all(executor)
    .await
    .map(sorted)
}

pub(crate) async fn unlock(
    executor: impl sqlx::PgExecutor<'_>,
    ids: &[i64],
    now: PrimitiveDateTime,
) -> Result<Vec<i64>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_scalar::<_, i64>(
        "UPDATE exams SET is_locked = FALSE, locked_by = NULL, locked_at = NULL, updated_at = $1
         WHERE id = ANY($2) AND is_locked = TRUE
         RETURNING id",
    )
    .bind(now)
    .bind(ids)
    .fetch_all(executor)
    .await
    .map(sorted)
}

fn sorted(mut ids: Vec<i64>) -> Vec<i64> {
    ids.sort_unstable();
    ids
}
