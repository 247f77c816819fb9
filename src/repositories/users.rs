#[cfg(test)]
use time::PrimitiveDateTime;

use crate::db::models::User;
#[cfg(test)]
use crate::db::types::UserRole;

const COLUMNS: &str = "id, name, email, role, is_frozen, is_deleted, created_at";

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: i64,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

#[cfg(test)]
pub(crate) struct CreateUser<'a> {
    pub(crate) name: Option<&'a str>,
    pub(crate) email: &'a str,
    pub(crate) role: UserRole,
    pub(crate) created_at: PrimitiveDateTime,
}

#[cfg(test)]
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateUser<'_>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (name, email, role, is_frozen, is_deleted, created_at)
         VALUES ($1,$2,$3,FALSE,FALSE,$4)
         RETURNING {COLUMNS}",
    ))
    .bind(params.name)
    .bind(params.email)
    .bind(params.role)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}
