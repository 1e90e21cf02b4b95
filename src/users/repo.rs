use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database. The avatar blob is deliberately not part of
/// this struct so profile reads never haul image bytes around; see the
/// avatar-specific queries below.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub age: i32,
    pub created_at: OffsetDateTime,
}

const USER_COLUMNS: &str = "id, name, email, password_hash, age, created_at";

impl User {
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
        age: i32,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, age)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password_hash, age, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(age)
        .fetch_one(db)
        .await
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(db)
                .await?;
        Ok(user)
    }

    /// Persist the (already validated) profile fields of this instance.
    pub async fn update(&self, db: &PgPool) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $2, email = $3, password_hash = $4, age = $5
            WHERE id = $1
            RETURNING id, name, email, password_hash, age, created_at
            "#,
        )
        .bind(self.id)
        .bind(&self.name)
        .bind(&self.email)
        .bind(&self.password_hash)
        .bind(self.age)
        .fetch_one(db)
        .await
    }

    /// Delete the account. Sessions go with it via ON DELETE CASCADE.
    pub async fn delete(&self, db: &PgPool) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(self.id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn set_avatar(&self, db: &PgPool, png: &[u8]) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET avatar = $2 WHERE id = $1")
            .bind(self.id)
            .bind(png)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn clear_avatar(&self, db: &PgPool) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET avatar = NULL WHERE id = $1")
            .bind(self.id)
            .execute(db)
            .await?;
        Ok(())
    }
}

/// Avatar bytes for any account, by id. Public read, no session required.
/// `None` when the account does not exist or has no avatar set.
pub async fn fetch_avatar(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<Vec<u8>>> {
    let row: Option<(Option<Vec<u8>>,)> =
        sqlx::query_as("SELECT avatar FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(db)
            .await?;
    Ok(row.and_then(|(avatar,)| avatar))
}
