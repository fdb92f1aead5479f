use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::data_formats::ArticleSort;
use crate::errors::RequestError;
use crate::models::{Article, ArticleWithAuthor};

const ARTICLE_COLUMNS: &str = "id, title, content, author_id, status, created_at, updated_at, \
                               published_at, like_count, read_count";

const ARTICLE_WITH_AUTHOR_QUERY: &str = "\
    SELECT articles.id           AS id, \
           articles.title        AS title, \
           articles.content      AS content, \
           articles.author_id    AS author_id, \
           articles.status       AS status, \
           articles.created_at   AS created_at, \
           articles.updated_at   AS updated_at, \
           articles.published_at AS published_at, \
           articles.like_count   AS like_count, \
           articles.read_count   AS read_count, \
           users.username        AS author, \
           user_profiles.icon    AS icon \
    FROM articles \
        JOIN users ON articles.author_id = users.id \
        LEFT JOIN user_profiles ON user_profiles.user_id = users.id";

/// Maps a zero-row ownership-scoped write to its cause: the article either
/// does not exist, or belongs to someone else.
async fn missing_article_error(
    tx: &mut Transaction<'_, Sqlite>,
    article_id: i64,
) -> RequestError {
    let exists =
        sqlx::query_scalar::<Sqlite, i64>("SELECT EXISTS (SELECT 1 FROM articles WHERE id = $1)")
            .bind(article_id)
            .fetch_one(&mut *tx)
            .await;
    match exists {
        Ok(0) => RequestError::NotFound("Article not found"),
        Ok(_) => RequestError::Forbidden,
        Err(error) => RequestError::DatabaseError(error),
    }
}

pub async fn create_article_in_db(
    pool: &SqlitePool,
    author_id: i64,
    title: &str,
    content: &str,
) -> Result<i64, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        "INSERT INTO articles (title, content, author_id, status, created_at) \
         VALUES ($1, $2, $3, 'draft', datetime('now'))",
    )
    .bind(title)
    .bind(content)
    .bind(author_id)
    .execute(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(result.last_insert_rowid())
}

/// Publish is unconditional with respect to the current status: publishing
/// again refreshes `published_at`. Only the author may do it.
pub async fn publish_article_in_db(
    pool: &SqlitePool,
    author_id: i64,
    article_id: i64,
) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        "UPDATE articles SET status = 'published', published_at = datetime('now') \
         WHERE id = $1 AND author_id = $2",
    )
    .bind(article_id)
    .bind(author_id)
    .execute(&mut tx)
    .await?;
    if result.rows_affected() == 0 {
        return Err(missing_article_error(&mut tx, article_id).await);
    }
    tx.commit().await?;
    Ok(())
}

/// Edit keeps the status untouched in either lifecycle state; it bumps
/// `updated_at` and is scoped to the author.
pub async fn edit_article_in_db(
    pool: &SqlitePool,
    author_id: i64,
    article_id: i64,
    title: &str,
    content: &str,
) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        "UPDATE articles SET title = $1, content = $2, updated_at = datetime('now') \
         WHERE id = $3 AND author_id = $4",
    )
    .bind(title)
    .bind(content)
    .bind(article_id)
    .bind(author_id)
    .execute(&mut tx)
    .await?;
    if result.rows_affected() == 0 {
        return Err(missing_article_error(&mut tx, article_id).await);
    }
    tx.commit().await?;
    Ok(())
}

pub async fn delete_article_in_db(
    pool: &SqlitePool,
    author_id: i64,
    article_id: i64,
) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query("DELETE FROM articles WHERE id = $1 AND author_id = $2")
        .bind(article_id)
        .bind(author_id)
        .execute(&mut tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(missing_article_error(&mut tx, article_id).await);
    }
    tx.commit().await?;
    Ok(())
}

/// Edit-page fetch, with the same ownership rules as the write operations.
pub async fn get_article_for_edit_in_db(
    pool: &SqlitePool,
    author_id: i64,
    article_id: i64,
) -> Result<Article, RequestError> {
    let mut tx = pool.begin().await?;
    let query = format!("SELECT {} FROM articles WHERE id = $1", ARTICLE_COLUMNS);
    let article = sqlx::query_as::<Sqlite, Article>(&query)
        .bind(article_id)
        .fetch_optional(&mut tx)
        .await?
        .ok_or(RequestError::NotFound("Article not found"))?;
    tx.commit().await?;
    if article.author_id != author_id {
        return Err(RequestError::Forbidden);
    }
    Ok(article)
}

pub async fn list_articles_by_author_in_db(
    pool: &SqlitePool,
    author_id: i64,
    sort: &ArticleSort,
) -> Result<Vec<Article>, RequestError> {
    let mut tx = pool.begin().await?;
    let query = format!(
        "SELECT {} FROM articles WHERE author_id = $1 ORDER BY {} {}",
        ARTICLE_COLUMNS,
        sort.key.column(),
        sort.order.sql()
    );
    let articles = sqlx::query_as::<Sqlite, Article>(&query)
        .bind(author_id)
        .fetch_all(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(articles)
}

/// The public reader listing: published articles only, joined with the
/// author's username.
pub async fn list_published_articles_in_db(
    pool: &SqlitePool,
    sort: &ArticleSort,
) -> Result<Vec<ArticleWithAuthor>, RequestError> {
    let mut tx = pool.begin().await?;
    let query = format!(
        "{} WHERE articles.status = 'published' ORDER BY {} {}",
        ARTICLE_WITH_AUTHOR_QUERY,
        sort.key.column(),
        sort.order.sql()
    );
    let articles = sqlx::query_as::<Sqlite, ArticleWithAuthor>(&query)
        .fetch_all(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(articles)
}

pub async fn get_article_with_author_in_db(
    pool: &SqlitePool,
    article_id: i64,
) -> Result<Option<ArticleWithAuthor>, RequestError> {
    let mut tx = pool.begin().await?;
    let query = format!("{} WHERE articles.id = $1", ARTICLE_WITH_AUTHOR_QUERY);
    let article = sqlx::query_as::<Sqlite, ArticleWithAuthor>(&query)
        .bind(article_id)
        .fetch_optional(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(article)
}

/// Every detail view counts, the author's own included. Callers log a
/// failure and carry on; the fetch must not depend on this succeeding.
pub async fn increment_read_count_in_db(
    pool: &SqlitePool,
    article_id: i64,
) -> Result<(), RequestError> {
    sqlx::query("UPDATE articles SET read_count = read_count + 1 WHERE id = $1")
        .bind(article_id)
        .execute(pool)
        .await?;
    Ok(())
}
