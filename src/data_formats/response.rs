use chrono::{Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::authentication::SessionUser;
use crate::models::{Article, ArticleStatus, ArticleWithAuthor, CommentWithIcon, DEFAULT_ICON};

const NOT_MODIFIED: &str = "Not modified";
const NOT_PUBLISHED: &str = "Not published";

/// Timestamps are stored in UTC and presented in the server's local time.
fn format_local(value: &NaiveDateTime) -> String {
    Local
        .from_utc_datetime(value)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

fn format_local_or(value: Option<&NaiveDateTime>, fallback: &str) -> String {
    value.map(format_local).unwrap_or_else(|| fallback.to_string())
}

// ----------------- JSON Bodies -----------------

#[derive(Deserialize, Serialize, Debug)]
pub struct ExistsResponse {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct PasswordCheckResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct LikeCountResponse {
    #[serde(rename = "likeCount")]
    pub like_count: i64,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct SessionInfo {
    pub authenticated: bool,
    #[serde(flatten)]
    pub user: Option<SessionUser>,
}

// ----------------- Page Projections -----------------
// The templating layer is an external collaborator; these are the read-only
// view models it consumes, one per rendered page.

#[derive(Deserialize, Serialize, Debug)]
pub struct HomePage {
    pub title: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct SignupPage {
    pub title: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct LoginPage {
    pub title: String,
    #[serde(rename = "errorMessage")]
    pub error_message: Option<String>,
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewArticlePage {
    pub title: String,
    pub blog_title: String,
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPage {
    pub title: String,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub blog_title: String,
    pub bio: String,
    pub introduction: String,
    pub icon: String,
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProfileArticle {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub status: ArticleStatus,
    pub created_date: String,
    pub modified_date: String,
    pub published_date: String,
    pub like_count: i64,
    pub read_count: i64,
}

impl ProfileArticle {
    pub fn new(
        Article {
            id,
            title,
            content,
            status,
            created_at,
            updated_at,
            published_at,
            like_count,
            read_count,
            ..
        }: Article,
    ) -> Self {
        ProfileArticle {
            id,
            title,
            content,
            status,
            created_date: format_local(&created_at),
            modified_date: format_local_or(updated_at.as_ref(), NOT_MODIFIED),
            published_date: format_local_or(published_at.as_ref(), NOT_PUBLISHED),
            like_count,
            read_count,
        }
    }
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePage {
    pub title: String,
    pub username: String,
    pub display_name: String,
    pub blog_title: String,
    pub bio: String,
    pub introduction: String,
    pub icon: String,
    pub articles: Vec<ProfileArticle>,
    pub sort_by: String,
    pub sort_order: String,
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ReaderArticle {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author: String,
    pub status: ArticleStatus,
    pub published_date: String,
    pub like_count: i64,
    pub read_count: i64,
}

impl ReaderArticle {
    pub fn new(
        ArticleWithAuthor {
            id,
            title,
            content,
            status,
            published_at,
            like_count,
            read_count,
            author,
            ..
        }: ArticleWithAuthor,
    ) -> Self {
        ReaderArticle {
            id,
            title,
            content,
            author,
            status,
            published_date: format_local_or(published_at.as_ref(), NOT_PUBLISHED),
            like_count,
            read_count,
        }
    }
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ReaderPage {
    pub title: String,
    pub blogs: Vec<ReaderArticle>,
    pub sort_by: String,
    pub sort_order: String,
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDetail {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author: String,
    pub icon: String,
    pub status: ArticleStatus,
    pub created_date: String,
    pub modified_date: String,
    pub published_date: String,
    pub like_count: i64,
    pub read_count: i64,
}

impl ArticleDetail {
    pub fn new(
        ArticleWithAuthor {
            id,
            title,
            content,
            status,
            created_at,
            updated_at,
            published_at,
            like_count,
            read_count,
            author,
            icon,
            ..
        }: ArticleWithAuthor,
    ) -> Self {
        ArticleDetail {
            id,
            title,
            content,
            author,
            icon: icon.unwrap_or_else(|| DEFAULT_ICON.to_string()),
            status,
            created_date: format_local(&created_at),
            modified_date: format_local_or(updated_at.as_ref(), NOT_MODIFIED),
            published_date: format_local_or(published_at.as_ref(), NOT_PUBLISHED),
            like_count,
            read_count,
        }
    }
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: i64,
    pub username: String,
    pub body: String,
    pub icon: String,
    pub created_date: String,
}

impl CommentView {
    pub fn new(
        CommentWithIcon {
            id,
            username,
            body,
            created_at,
            icon,
            ..
        }: CommentWithIcon,
    ) -> Self {
        CommentView {
            id,
            username,
            body,
            icon: icon.unwrap_or_else(|| DEFAULT_ICON.to_string()),
            created_date: format_local(&created_at),
        }
    }
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ArticlePage {
    pub title: String,
    pub article: ArticleDetail,
    pub comments: Vec<CommentView>,
}

impl ArticlePage {
    pub fn new(article: ArticleWithAuthor, comments: Vec<CommentWithIcon>) -> Self {
        let article = ArticleDetail::new(article);
        ArticlePage {
            title: article.title.clone(),
            comments: comments.into_iter().map(CommentView::new).collect(),
            article,
        }
    }
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct EditArticle {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub status: ArticleStatus,
    pub created_date: String,
    pub published_date: String,
}

impl EditArticle {
    pub fn new(
        Article {
            id,
            title,
            content,
            status,
            created_at,
            published_at,
            ..
        }: Article,
    ) -> Self {
        EditArticle {
            id,
            title,
            content,
            status,
            created_date: format_local(&created_at),
            published_date: format_local_or(published_at.as_ref(), NOT_PUBLISHED),
        }
    }
}

#[derive(Deserialize, Serialize, Debug)]
pub struct EditArticlePage {
    pub title: String,
    pub article: EditArticle,
}
