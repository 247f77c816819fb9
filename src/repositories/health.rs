use sqlx::PgPool;

pub(crate) async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    let value: i32 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;
    if value != 1 {
        return Err(sqlx::Error::Protocol(format!("unexpected ping result {value}")));
    }
    Ok(())
}
