//! User CRUD operations, keyed by username.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::User;

/// Create a new user.
pub async fn create_user(pool: &SqlitePool, user: &User) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO users (username, hashed_password, email, full_name, disabled, scopes)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.hashed_password)
    .bind(&user.email)
    .bind(&user.full_name)
    .bind(user.disabled)
    .bind(&user.scopes)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "User",
                    id: user.username.clone(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Get a user by username.
pub async fn get_user(pool: &SqlitePool, username: &str) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT username, hashed_password, email, full_name, disabled, scopes
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "User",
        id: username.to_string(),
    })
}

/// List all users.
pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT username, hashed_password, email, full_name, disabled, scopes
        FROM users
        ORDER BY username
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// Enable or disable a user. Disabled users are rejected even with a
/// valid token.
pub async fn set_disabled(pool: &SqlitePool, username: &str, disabled: bool) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET disabled = ?
        WHERE username = ?
        "#,
    )
    .bind(disabled)
    .bind(username)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "User",
            id: username.to_string(),
        });
    }

    Ok(())
}

/// Delete a user by username.
pub async fn delete_user(pool: &SqlitePool, username: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM users
        WHERE username = ?
        "#,
    )
    .bind(username)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "User",
            id: username.to_string(),
        });
    }

    Ok(())
}
