use sqlx::{Sqlite, SqlitePool};

use crate::{
    data_formats::{RegisterForm, SettingsForm},
    errors::RequestError,
    models::{User, DEFAULT_BIO, DEFAULT_INTRODUCTION, DEFAULT_ICON},
};

use super::USER_COLUMNS;

/// Registration: the conflict probe, the user insert and the default
/// profile insert commit or roll back together, so a failure can never
/// leave a user without a profile row.
///
/// The probe reports a username collision before an email collision; the
/// UNIQUE constraints catch the race where two registrations pass the probe
/// concurrently.
pub async fn register_user_in_db(
    pool: &SqlitePool,
    form: &RegisterForm,
    password_hash: String,
) -> Result<i64, RequestError> {
    let mut tx = pool.begin().await?;

    let query = format!(
        "SELECT {} FROM users WHERE username = $1 OR email = $2",
        USER_COLUMNS
    );
    let existing = sqlx::query_as::<Sqlite, User>(&query)
        .bind(&form.username)
        .bind(&form.email)
        .fetch_optional(&mut tx)
        .await?;
    if let Some(user) = existing {
        if user.username == form.username {
            return Err(RequestError::Conflict("Username already exists"));
        }
        return Err(RequestError::Conflict("Email already exists"));
    }

    let result = sqlx::query("INSERT INTO users (username, email, password) VALUES ($1, $2, $3)")
        .bind(&form.username)
        .bind(&form.email)
        .bind(password_hash)
        .execute(&mut tx)
        .await
        .map_err(map_user_unique_violation)?;
    let user_id = result.last_insert_rowid();

    sqlx::query(
        "INSERT INTO user_profiles (user_id, bio, introduction, display_name, blog_title, icon) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(user_id)
    .bind(DEFAULT_BIO)
    .bind(DEFAULT_INTRODUCTION)
    .bind(&form.username)
    .bind(crate::models::default_blog_title(&form.username))
    .bind(DEFAULT_ICON)
    .execute(&mut tx)
    .await?;

    tx.commit().await?;
    Ok(user_id)
}

pub async fn username_exists(pool: &SqlitePool, username: &str) -> Result<bool, RequestError> {
    let exists = sqlx::query_scalar::<Sqlite, i64>(
        "SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)",
    )
    .bind(username)
    .fetch_one(pool)
    .await?;
    Ok(exists != 0)
}

pub async fn email_exists(pool: &SqlitePool, email: &str) -> Result<bool, RequestError> {
    let exists =
        sqlx::query_scalar::<Sqlite, i64>("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(pool)
            .await?;
    Ok(exists != 0)
}

/// Settings update: one transaction covering the users row and the profile
/// upsert. `password_hash` is `None` when the form left the password blank,
/// in which case the stored hash is kept.
pub async fn update_user_settings_in_db(
    pool: &SqlitePool,
    user_id: i64,
    form: &SettingsForm,
    password_hash: Option<String>,
) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;

    let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
    let current = sqlx::query_as::<Sqlite, User>(&query)
        .bind(user_id)
        .fetch_optional(&mut tx)
        .await?
        .ok_or(RequestError::NotFound("User not found"))?;
    let password = password_hash.unwrap_or(current.password);

    sqlx::query("UPDATE users SET username = $1, email = $2, password = $3 WHERE id = $4")
        .bind(&form.username)
        .bind(&form.email)
        .bind(password)
        .bind(user_id)
        .execute(&mut tx)
        .await
        .map_err(map_user_unique_violation)?;

    sqlx::query(
        "INSERT INTO user_profiles (user_id, bio, introduction, display_name, blog_title, icon) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (user_id) DO UPDATE SET \
         bio = excluded.bio, introduction = excluded.introduction, \
         display_name = excluded.display_name, blog_title = excluded.blog_title, \
         icon = excluded.icon",
    )
    .bind(user_id)
    .bind(&form.bio)
    .bind(&form.introduction)
    .bind(&form.display_name)
    .bind(&form.blog_title)
    .bind(&form.icon)
    .execute(&mut tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

fn map_user_unique_violation(error: sqlx::Error) -> RequestError {
    if RequestError::is_unique_violation(&error, "users.username") {
        return RequestError::Conflict("Username already exists");
    }
    if RequestError::is_unique_violation(&error, "users.email") {
        return RequestError::Conflict("Email already exists");
    }
    RequestError::DatabaseError(error)
}
