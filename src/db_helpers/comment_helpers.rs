use sqlx::{Sqlite, SqlitePool};

use crate::{errors::RequestError, models::CommentWithIcon};

/// Comments attach to any existing article, draft or published; the foreign
/// key is what rejects a comment on a missing one.
pub async fn add_comment_in_db(
    pool: &SqlitePool,
    article_id: i64,
    username: &str,
    body: &str,
) -> Result<i64, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        "INSERT INTO comments (article_id, username, body, created_at) \
         VALUES ($1, $2, $3, datetime('now'))",
    )
    .bind(article_id)
    .bind(username)
    .bind(body)
    .execute(&mut tx)
    .await
    .map_err(|error| {
        if RequestError::is_foreign_key_violation(&error) {
            return RequestError::NotFound("Article not found");
        }
        RequestError::DatabaseError(error)
    })?;
    tx.commit().await?;
    Ok(result.last_insert_rowid())
}

pub async fn get_comments_for_article_in_db(
    pool: &SqlitePool,
    article_id: i64,
) -> Result<Vec<CommentWithIcon>, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query_as::<Sqlite, CommentWithIcon>(
        "SELECT comments.id         AS id, \
                comments.article_id AS article_id, \
                comments.username   AS username, \
                comments.body       AS body, \
                comments.created_at AS created_at, \
                user_profiles.icon  AS icon \
         FROM comments \
             JOIN users ON comments.username = users.username \
             LEFT JOIN user_profiles ON user_profiles.user_id = users.id \
         WHERE comments.article_id = $1 \
         ORDER BY comments.id ASC",
    )
    .bind(article_id)
    .fetch_all(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(result)
}
