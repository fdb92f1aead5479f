use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BIO: &str = "No bio available.";
pub const DEFAULT_INTRODUCTION: &str = "No introduction available.";
pub const DEFAULT_ICON: &str = "user.png";

pub fn default_blog_title(display_name: &str) -> String {
    format!("{}'s Blog", display_name)
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserProfile {
    pub user_id: i64,
    pub bio: String,
    pub introduction: String,
    pub display_name: String,
    pub blog_title: String,
    pub icon: String,
}

/// One-way lifecycle: an article starts as a draft and can only move to
/// published. `published_at` is set exactly when the status is `Published`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Draft,
    Published,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub status: ArticleStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
    pub published_at: Option<NaiveDateTime>,
    pub like_count: i64,
    pub read_count: i64,
}

/// Article joined with the author's username and profile icon, as the reader
/// and detail views consume it. The icon comes from a left join, so a user
/// without a profile row still shows up.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArticleWithAuthor {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub status: ArticleStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
    pub published_at: Option<NaiveDateTime>,
    pub like_count: i64,
    pub read_count: i64,
    pub author: String,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentWithIcon {
    pub id: i64,
    pub article_id: i64,
    pub username: String,
    pub body: String,
    pub created_at: NaiveDateTime,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Like {
    pub user_id: i64,
    pub article_id: i64,
}
