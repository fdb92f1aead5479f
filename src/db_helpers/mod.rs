use sqlx::{Sqlite, SqlitePool};

use crate::{errors::RequestError, models::User};

mod article_helpers;
mod comment_helpers;
mod like_helpers;
mod profile_helpers;
mod user_helpers;

pub use article_helpers::*;
pub use comment_helpers::*;
pub use like_helpers::*;
pub use profile_helpers::*;
pub use user_helpers::*;

const USER_COLUMNS: &str = "id, username, email, password, created_at";

// ----------------- Shared Lookups -----------------

pub async fn get_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, RequestError> {
    let mut tx = pool.begin().await?;
    let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
    let result = sqlx::query_as::<Sqlite, User>(&query)
        .bind(id)
        .fetch_optional(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(result)
}

/// Login lookup: a single identifier matches either the username or the
/// email column. Password verification happens against the returned hash,
/// never in SQL.
pub async fn get_user_by_username_or_email(
    pool: &SqlitePool,
    identifier: &str,
) -> Result<Option<User>, RequestError> {
    let mut tx = pool.begin().await?;
    let query = format!(
        "SELECT {} FROM users WHERE username = $1 OR email = $1",
        USER_COLUMNS
    );
    let result = sqlx::query_as::<Sqlite, User>(&query)
        .bind(identifier)
        .fetch_optional(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(result)
}
