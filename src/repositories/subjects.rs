use time::PrimitiveDateTime;

use crate::db::models::CatalogSubject;

const COLUMNS: &str = "id, programme, semester, subject_code, subject_name, is_active, created_at";

pub(crate) const ACTIVE_UNIQUE_INDEX: &str = "uq_subject_catalog_active";

pub(crate) async fn list_active(
    executor: impl sqlx::PgExecutor<'_>,
    programme: &str,
    semester: i32,
) -> Result<Vec<CatalogSubject>, sqlx::Error> {
    sqlx::query_as::<_, CatalogSubject>(&format!(
        "SELECT {COLUMNS} FROM subject_catalog
         WHERE programme = $1 AND semester = $2 AND is_active
         ORDER BY subject_code ASC"
    ))
    .bind(programme)
    .bind(semester)
    .fetch_all(executor)
    .await
}

pub(crate) async fn list_programmes(
    executor: impl sqlx::PgExecutor<'_>,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT DISTINCT programme FROM subject_catalog WHERE is_active ORDER BY programme ASC",
    )
    .fetch_all(executor)
    .await
}

pub(crate) async fn list_semesters(
    executor: impl sqlx::PgExecutor<'_>,
    programme: &str,
) -> Result<Vec<i32>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT DISTINCT semester FROM subject_catalog
         WHERE programme = $1 AND is_active
         ORDER BY semester ASC",
    )
    .bind(programme)
    .fetch_all(executor)
    .await
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: i64,
) -> Result<Option<CatalogSubject>, sqlx::Error> {
    sqlx::query_as::<_, CatalogSubject>(&format!(
        "SELECT {COLUMNS} FROM subject_catalog WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn active_exists(
    executor: impl sqlx::PgExecutor<'_>,
    programme: &str,
    semester: i32,
    subject_code: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT 1 FROM subject_catalog
            WHERE programme = $1 AND semester = $2 AND subject_code = $3 AND is_active
         )",
    )
    .bind(programme)
    .bind(semester)
    .bind(subject_code)
    .fetch_one(executor)
    .await
}

pub(crate) struct CreateSubject<'a> {
    pub(crate) programme: &'a str,
    pub(crate) semester: i32,
    pub(crate) subject_code: &'a str,
    pub(crate) subject_name: &'a str,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateSubject<'_>,
) -> Result<CatalogSubject, sqlx::Error> {
    sqlx::query_as::<_, CatalogSubject>(&format!(
        "INSERT INTO subject_catalog (
            programme, semester, subject_code, subject_name, is_active, created_at
         )
         VALUES ($1,$2,$3,$4,TRUE,$5)
         RETURNING {COLUMNS}"
    ))
    .bind(params.programme)
    .bind(params.semester)
    .bind(params.subject_code)
    .bind(params.subject_name)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

/// Returns `false` when the row was already inactive or does not exist.
pub(crate) async fn deactivate(
    executor: impl sqlx::PgExecutor<'_>,
    id: i64,
) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE subject_catalog SET is_active = FALSE WHERE id = $1 AND is_active")
            .bind(id)
            .execute(executor)
            .await?;
    Ok(result.rows_affected() == 1)
}

pub(crate) async fn search_active(
    executor: impl sqlx::PgExecutor<'_>,
    name_fragment: &str,
    limit: i64,
) -> Result<Vec<CatalogSubject>, sqlx::Error> {
    sqlx::query_as::<_, CatalogSubject>(&format!(
        "SELECT {COLUMNS} FROM subject_catalog
         WHERE is_active AND subject_name ILIKE $1
         ORDER BY subject_name ASC, programme ASC, semester ASC
         LIMIT $2"
    ))
    .bind(format!("%{name_fragment}%"))
    .bind(limit)
    .fetch_all(executor)
    .await
}
