use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::{StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
    Extension, Form, Json,
};
use axum_sessions::extractors::{ReadableSession, WritableSession};
use sqlx::SqlitePool;

use crate::authentication::{
    hash_password_argon2, verify_password_argon2, AuthSession, SessionUser, SESSION_USER_KEY,
};
use crate::data_formats::{
    ArticleForm, ArticlePage, ArticleSort, CommentForm, EditArticle, EditArticlePage, EmailQuery,
    ExistsResponse, HomePage, LikeCountResponse, LoginForm, LoginPage, NewArticlePage,
    PasswordCheckResponse, PasswordQuery, ProfileArticle, ProfilePage, ReaderArticle, ReaderPage,
    RegisterForm, SessionInfo, SettingsForm, SettingsPage, SignupPage, SortQuery, UsernameQuery,
};
use crate::db_helpers::{
    add_comment_in_db, create_article_in_db, delete_article_in_db, edit_article_in_db,
    email_exists, get_article_for_edit_in_db, get_article_with_author_in_db,
    get_comments_for_article_in_db, get_profile_for_user, get_settings_in_db, get_user_by_id,
    get_user_by_username_or_email, increment_read_count_in_db, like_article_in_db,
    list_articles_by_author_in_db, list_published_articles_in_db, publish_article_in_db,
    register_user_in_db, update_user_settings_in_db, username_exists,
};
use crate::errors::{RequestError, INVALID_CREDENTIALS_MESSAGE};
use crate::models::User;
use crate::JsonResponse;

// ----------------- Helper Handlers -----------------
pub async fn alive() -> &'static str {
    "alive"
}

pub async fn home() -> Json<HomePage> {
    Json(HomePage {
        title: "Home".to_string(),
    })
}

pub async fn not_found(uri: Uri) -> Result<(), (StatusCode, String)> {
    Err((
        StatusCode::NOT_FOUND,
        format!("URL {} provided was not found", uri),
    ))
}

// ----------------- Auth Handlers -----------------
pub async fn add_user_page() -> Json<SignupPage> {
    Json(SignupPage {
        title: "Add User".to_string(),
    })
}

pub async fn register_user(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Form(form): Form<RegisterForm>,
) -> Result<Redirect, RequestError> {
    if form.username.trim().is_empty() || form.email.trim().is_empty() || form.password.is_empty()
    {
        return Err(RequestError::Validation(
            "Username, email and password are required",
        ));
    }
    let password_hash = hash_password_argon2(form.password.clone())
        .await
        .map_err(|_| RequestError::ServerError)?;
    register_user_in_db(&pool, &form, password_hash).await?;
    tracing::info!("new user registered: {}", form.username);
    Ok(Redirect::to("/login"))
}

pub async fn check_username(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Query(query): Query<UsernameQuery>,
) -> JsonResponse<ExistsResponse> {
    match username_exists(&pool, &query.username).await {
        Ok(exists) => (StatusCode::OK, Json(ExistsResponse { exists, error: None })),
        Err(error) => {
            tracing::error!("username probe failed: {:?}", error);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ExistsResponse {
                    exists: false,
                    error: None,
                }),
            )
        }
    }
}

pub async fn check_email(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Query(query): Query<EmailQuery>,
) -> JsonResponse<ExistsResponse> {
    match email_exists(&pool, &query.email).await {
        Ok(exists) => (StatusCode::OK, Json(ExistsResponse { exists, error: None })),
        Err(error) => {
            tracing::error!("email probe failed: {:?}", error);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ExistsResponse {
                    exists: false,
                    error: Some("Database error".to_string()),
                }),
            )
        }
    }
}

pub async fn login_page() -> Json<LoginPage> {
    Json(LoginPage {
        title: "Login".to_string(),
        error_message: None,
    })
}

async fn verify_credentials(pool: &SqlitePool, form: &LoginForm) -> Result<User, RequestError> {
    let user = get_user_by_username_or_email(pool, &form.username_or_email)
        .await?
        .ok_or(RequestError::InvalidCredentials)?;
    let valid = verify_password_argon2(form.password.clone(), user.password.clone())
        .await
        .map_err(|_| RequestError::ServerError)?;
    if !valid {
        return Err(RequestError::InvalidCredentials);
    }
    Ok(user)
}

pub async fn login_user(
    Extension(pool): Extension<Arc<SqlitePool>>,
    mut session: WritableSession,
    Form(form): Form<LoginForm>,
) -> Result<Response, RequestError> {
    match verify_credentials(&pool, &form).await {
        Ok(user) => {
            let profile = get_profile_for_user(&pool, user.id).await?;
            let session_user = SessionUser::new(user, profile);
            session
                .insert(SESSION_USER_KEY, session_user)
                .map_err(|_| RequestError::SessionError)?;
            Ok(Redirect::to("/profile").into_response())
        }
        // Unknown user and wrong password answer identically; the login page
        // itself is the failure response, not an error body.
        Err(RequestError::InvalidCredentials) => Ok((
            StatusCode::UNAUTHORIZED,
            Json(LoginPage {
                title: "Login".to_string(),
                error_message: Some(INVALID_CREDENTIALS_MESSAGE.to_string()),
            }),
        )
            .into_response()),
        Err(error) => Err(error),
    }
}

pub async fn logout_user(mut session: WritableSession) -> Redirect {
    session.destroy();
    Redirect::to("/login")
}

pub async fn session_info(session: ReadableSession) -> Json<SessionInfo> {
    let user = session.get::<SessionUser>(SESSION_USER_KEY);
    Json(SessionInfo {
        authenticated: user.is_some(),
        user,
    })
}

// ----------------- Profile Handlers -----------------
pub async fn profile_page(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthSession(user): AuthSession,
    Query(query): Query<SortQuery>,
) -> Result<Json<ProfilePage>, RequestError> {
    let sort = ArticleSort::from_query(&query, true);
    let articles = list_articles_by_author_in_db(&pool, user.user_id, &sort).await?;
    Ok(Json(ProfilePage {
        title: "Profile".to_string(),
        username: user.username,
        display_name: user.display_name,
        blog_title: user.blog_title,
        bio: user.bio,
        introduction: user.introduction,
        icon: user.icon,
        articles: articles.into_iter().map(ProfileArticle::new).collect(),
        sort_by: sort.key.param().to_string(),
        sort_order: sort.order.param().to_string(),
    }))
}

pub async fn settings_page(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthSession(user): AuthSession,
) -> Result<Json<SettingsPage>, RequestError> {
    let (user_row, profile) = get_settings_in_db(&pool, user.user_id).await?;
    // Same fallback rules as the login-time cache build.
    let view = SessionUser::new(user_row, profile);
    Ok(Json(SettingsPage {
        title: "Settings".to_string(),
        username: view.username,
        email: view.email,
        display_name: view.display_name,
        blog_title: view.blog_title,
        bio: view.bio,
        introduction: view.introduction,
        icon: view.icon,
    }))
}

pub async fn update_settings(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthSession(user): AuthSession,
    mut session: WritableSession,
    Form(form): Form<SettingsForm>,
) -> Result<Redirect, RequestError> {
    if form.username.trim().is_empty() || form.email.trim().is_empty() {
        return Err(RequestError::Validation("Username and email are required"));
    }
    let password_hash = if form.password.is_empty() {
        None
    } else {
        Some(
            hash_password_argon2(form.password.clone())
                .await
                .map_err(|_| RequestError::ServerError)?,
        )
    };
    update_user_settings_in_db(&pool, user.user_id, &form, password_hash).await?;

    // The session is a cache of the rows just written; refresh it or every
    // later read in this session goes stale.
    let refreshed = SessionUser {
        user_id: user.user_id,
        username: form.username,
        email: form.email,
        display_name: form.display_name,
        blog_title: form.blog_title,
        bio: form.bio,
        introduction: form.introduction,
        icon: form.icon,
    };
    session
        .insert(SESSION_USER_KEY, refreshed)
        .map_err(|_| RequestError::SessionError)?;
    Ok(Redirect::to("/profile"))
}

pub async fn check_password(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthSession(user): AuthSession,
    Query(query): Query<PasswordQuery>,
) -> JsonResponse<PasswordCheckResponse> {
    let valid = match get_user_by_id(&pool, user.user_id).await {
        Ok(Some(row)) => match verify_password_argon2(query.password, row.password).await {
            Ok(valid) => valid,
            Err(error) => {
                tracing::error!("password check failed: {:?}", error);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(PasswordCheckResponse {
                        valid: false,
                        error: Some("Password check failed".to_string()),
                    }),
                );
            }
        },
        Ok(None) => false,
        Err(error) => {
            tracing::error!("password check failed: {:?}", error);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(PasswordCheckResponse {
                    valid: false,
                    error: Some("Database error".to_string()),
                }),
            );
        }
    };
    (StatusCode::OK, Json(PasswordCheckResponse { valid, error: None }))
}

// ----------------- Article Handlers -----------------
pub async fn new_article_page(AuthSession(user): AuthSession) -> Json<NewArticlePage> {
    Json(NewArticlePage {
        title: "New Article".to_string(),
        blog_title: user.blog_title,
    })
}

pub async fn create_article(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthSession(user): AuthSession,
    Form(form): Form<ArticleForm>,
) -> Result<Redirect, RequestError> {
    if form.title.trim().is_empty() {
        return Err(RequestError::Validation("Title is required"));
    }
    let article_id = create_article_in_db(&pool, user.user_id, &form.title, &form.content).await?;
    tracing::info!("new article {} created: {}", article_id, form.title);
    Ok(Redirect::to("/profile"))
}

pub async fn publish_article(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthSession(user): AuthSession,
    Path(article_id): Path<i64>,
) -> Result<StatusCode, RequestError> {
    publish_article_in_db(&pool, user.user_id, article_id).await?;
    Ok(StatusCode::OK)
}

pub async fn delete_article(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthSession(user): AuthSession,
    Path(article_id): Path<i64>,
) -> Result<StatusCode, RequestError> {
    delete_article_in_db(&pool, user.user_id, article_id).await?;
    Ok(StatusCode::OK)
}

pub async fn edit_article_page(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthSession(user): AuthSession,
    Path(article_id): Path<i64>,
) -> Result<Json<EditArticlePage>, RequestError> {
    let article = get_article_for_edit_in_db(&pool, user.user_id, article_id).await?;
    Ok(Json(EditArticlePage {
        title: "Edit Article".to_string(),
        article: EditArticle::new(article),
    }))
}

pub async fn edit_article(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthSession(user): AuthSession,
    Path(article_id): Path<i64>,
    Form(form): Form<ArticleForm>,
) -> Result<Redirect, RequestError> {
    if form.title.trim().is_empty() {
        return Err(RequestError::Validation("Title is required"));
    }
    edit_article_in_db(&pool, user.user_id, article_id, &form.title, &form.content).await?;
    Ok(Redirect::to("/profile"))
}

// ----------------- Reader Handlers -----------------
pub async fn reader_page(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Query(query): Query<SortQuery>,
) -> Result<Json<ReaderPage>, RequestError> {
    let sort = ArticleSort::from_query(&query, false);
    let blogs = list_published_articles_in_db(&pool, &sort).await?;
    Ok(Json(ReaderPage {
        title: "Reader Home".to_string(),
        blogs: blogs.into_iter().map(ReaderArticle::new).collect(),
        sort_by: sort.key.param().to_string(),
        sort_order: sort.order.param().to_string(),
    }))
}

pub async fn article_page(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path(article_id): Path<i64>,
) -> Result<Json<ArticlePage>, RequestError> {
    // Fire-and-forget: a failed bump is logged and must not block the fetch.
    if let Err(error) = increment_read_count_in_db(&pool, article_id).await {
        tracing::error!(
            "failed to bump read count for article {}: {:?}",
            article_id,
            error
        );
    }
    let article = get_article_with_author_in_db(&pool, article_id)
        .await?
        .ok_or(RequestError::NotFound("Article not found"))?;
    let comments = get_comments_for_article_in_db(&pool, article_id).await?;
    Ok(Json(ArticlePage::new(article, comments)))
}

// ----------------- Engagement Handlers -----------------
pub async fn add_comment(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthSession(user): AuthSession,
    Path(article_id): Path<i64>,
    Form(form): Form<CommentForm>,
) -> Result<Redirect, RequestError> {
    if form.comment.trim().is_empty() {
        return Err(RequestError::Validation("Comment is required"));
    }
    add_comment_in_db(&pool, article_id, &user.username, &form.comment).await?;
    Ok(Redirect::to(&format!("/profile/article/{}", article_id)))
}

pub async fn like_article(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthSession(user): AuthSession,
    Path(article_id): Path<i64>,
) -> Result<Json<LikeCountResponse>, RequestError> {
    let like_count = like_article_in_db(&pool, user.user_id, article_id).await?;
    Ok(Json(LikeCountResponse { like_count }))
}
