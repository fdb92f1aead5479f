use sqlx::{Sqlite, SqlitePool};

use crate::{
    errors::RequestError,
    models::{User, UserProfile},
};

use super::get_user_by_id;

const PROFILE_COLUMNS: &str = "user_id, bio, introduction, display_name, blog_title, icon";

pub async fn get_profile_for_user(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Option<UserProfile>, RequestError> {
    let mut tx = pool.begin().await?;
    let query = format!(
        "SELECT {} FROM user_profiles WHERE user_id = $1",
        PROFILE_COLUMNS
    );
    let result = sqlx::query_as::<Sqlite, UserProfile>(&query)
        .bind(user_id)
        .fetch_optional(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(result)
}

/// Settings page read: the users row plus the profile row, if any. The
/// caller applies the display defaults for a missing profile.
pub async fn get_settings_in_db(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<(User, Option<UserProfile>), RequestError> {
    let user = get_user_by_id(pool, user_id)
        .await?
        .ok_or(RequestError::NotFound("User not found"))?;
    let profile = get_profile_for_user(pool, user_id).await?;
    Ok((user, profile))
}
