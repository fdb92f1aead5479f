use sqlx::{Sqlite, SqlitePool};

use crate::{errors::RequestError, models::Like};

/// At most one like per (user, article). The counter increment, the
/// duplicate probe, the like insert and the fresh-count read are one
/// transaction: an error on any step rolls the whole thing back.
///
/// The increment runs first so the transaction takes the write lock up
/// front; a concurrent duplicate then waits on it and sees the committed
/// like row. If both somehow pass the probe, the UNIQUE constraint on
/// (user_id, article_id) turns the second insert into `AlreadyLiked`.
pub async fn like_article_in_db(
    pool: &SqlitePool,
    user_id: i64,
    article_id: i64,
) -> Result<i64, RequestError> {
    let mut tx = pool.begin().await?;

    let touched = sqlx::query("UPDATE articles SET like_count = like_count + 1 WHERE id = $1")
        .bind(article_id)
        .execute(&mut tx)
        .await?;
    if touched.rows_affected() == 0 {
        return Err(RequestError::NotFound("Article not found"));
    }

    let existing = sqlx::query_as::<Sqlite, Like>(
        "SELECT user_id, article_id FROM likes WHERE user_id = $1 AND article_id = $2",
    )
    .bind(user_id)
    .bind(article_id)
    .fetch_optional(&mut tx)
    .await?;
    if existing.is_some() {
        return Err(RequestError::Conflict("Already liked"));
    }

    sqlx::query("INSERT INTO likes (user_id, article_id) VALUES ($1, $2)")
        .bind(user_id)
        .bind(article_id)
        .execute(&mut tx)
        .await
        .map_err(|error| {
            if RequestError::is_unique_violation(&error, "likes.") {
                return RequestError::Conflict("Already liked");
            }
            RequestError::DatabaseError(error)
        })?;

    let like_count =
        sqlx::query_scalar::<Sqlite, i64>("SELECT like_count FROM articles WHERE id = $1")
            .bind(article_id)
            .fetch_one(&mut tx)
            .await?;

    tx.commit().await?;
    Ok(like_count)
}
