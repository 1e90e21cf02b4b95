use sqlx::PgPool;
use uuid::Uuid;

/// Record a freshly issued token in the allow-list.
pub async fn insert(db: &PgPool, user_id: Uuid, token: &str) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO sessions (user_id, token)
        VALUES ($1, $2)
        "#,
    )
    .bind(user_id)
    .bind(token)
    .execute(db)
    .await?;
    Ok(())
}

/// Whether the exact token string is still on the allow-list for this user.
pub async fn exists(db: &PgPool, user_id: Uuid, token: &str) -> anyhow::Result<bool> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT id FROM sessions
        WHERE user_id = $1 AND token = $2
        "#,
    )
    .bind(user_id)
    .bind(token)
    .fetch_optional(db)
    .await?;
    Ok(row.is_some())
}

/// Revoke one token. Removing a token that is already gone is a no-op.
pub async fn remove(db: &PgPool, user_id: Uuid, token: &str) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        DELETE FROM sessions
        WHERE user_id = $1 AND token = $2
        "#,
    )
    .bind(user_id)
    .bind(token)
    .execute(db)
    .await?;
    Ok(())
}

/// Revoke every session of the user.
pub async fn remove_all(db: &PgPool, user_id: Uuid) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        DELETE FROM sessions
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(())
}
