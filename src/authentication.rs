use crate::models::{
    default_blog_title, User, UserProfile, DEFAULT_BIO, DEFAULT_ICON, DEFAULT_INTRODUCTION,
};
use anyhow::{Context, Result};
use argon2::PasswordVerifier;
use argon2::{password_hash::SaltString, Argon2, PasswordHash};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use axum_sessions::SessionHandle;
use serde::{Deserialize, Serialize};

pub const SESSION_USER_KEY: &str = "user";

/// The per-client session record: a denormalized cache of the User and
/// UserProfile rows, written at login and refreshed whenever the settings
/// update touches the underlying rows. Presence of this record is what
/// "authenticated" means.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub blog_title: String,
    pub bio: String,
    pub introduction: String,
    pub icon: String,
}

impl SessionUser {
    /// Builds the cache from the rows loaded at login. A missing or blank
    /// profile falls back to the registration defaults.
    pub fn new(user: User, profile: Option<UserProfile>) -> Self {
        let (bio, introduction, display_name, blog_title, icon) = match profile {
            Some(profile) => {
                let display_name = if profile.display_name.is_empty() {
                    user.username.clone()
                } else {
                    profile.display_name
                };
                let blog_title = if profile.blog_title.is_empty() {
                    default_blog_title(&display_name)
                } else {
                    profile.blog_title
                };
                let icon = if profile.icon.is_empty() {
                    DEFAULT_ICON.to_string()
                } else {
                    profile.icon
                };
                (profile.bio, profile.introduction, display_name, blog_title, icon)
            }
            None => (
                DEFAULT_BIO.to_string(),
                DEFAULT_INTRODUCTION.to_string(),
                user.username.clone(),
                default_blog_title(&user.username),
                DEFAULT_ICON.to_string(),
            ),
        };
        SessionUser {
            user_id: user.id,
            username: user.username,
            email: user.email,
            display_name,
            blog_title,
            bio,
            introduction,
            icon,
        }
    }
}

/// Rejection of the session gate: unauthenticated requests are sent to the
/// login page, never answered with an error status.
pub struct AuthRedirect;

impl IntoResponse for AuthRedirect {
    fn into_response(self) -> Response {
        Redirect::to("/login").into_response()
    }
}

/// Extractor guarding the authoring routes. Succeeds only when the session
/// holds a cached user; the check is read-only.
pub struct AuthSession(pub SessionUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync + 'static,
{
    type Rejection = AuthRedirect;
    async fn from_request_parts(
        parts: &mut Parts,
        _: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let handle = parts
            .extensions
            .get::<SessionHandle>()
            .cloned()
            .ok_or(AuthRedirect)?;
        let session = handle.read().await;
        match session.get::<SessionUser>(SESSION_USER_KEY) {
            Some(user) => Ok(AuthSession(user)),
            None => Err(AuthRedirect),
        }
    }
}

pub async fn verify_password_argon2(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || {
        let hash = PasswordHash::new(hash.as_str())
            .map_err(|_| anyhow::anyhow!("Failed to verify password"))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok())
    })
    .await
    .context("Failed to verify password")?
}

pub async fn hash_password_argon2(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(rand::thread_rng());
        let hash = PasswordHash::generate(Argon2::default(), password, salt.as_salt())
            .map_err(|_| anyhow::anyhow!("Failed to hash password"))?;
        Ok(hash.to_string())
    })
    .await
    .context("Failed to hash password")?
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn user() -> User {
        User {
            id: 7,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "hash".to_string(),
            created_at: NaiveDateTime::from_timestamp_opt(0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn hash_then_verify_round_trip() {
        let hash = hash_password_argon2("hunter2".to_string()).await.unwrap();
        assert_ne!(hash, "hunter2");
        assert!(verify_password_argon2("hunter2".to_string(), hash.clone())
            .await
            .unwrap());
        assert!(!verify_password_argon2("wrong".to_string(), hash)
            .await
            .unwrap());
    }

    #[test]
    fn missing_profile_falls_back_to_defaults() {
        let session_user = SessionUser::new(user(), None);
        assert_eq!(session_user.display_name, "alice");
        assert_eq!(session_user.blog_title, "alice's Blog");
        assert_eq!(session_user.bio, DEFAULT_BIO);
        assert_eq!(session_user.icon, DEFAULT_ICON);
    }

    #[test]
    fn blank_profile_fields_fall_back_too() {
        let profile = UserProfile {
            user_id: 7,
            bio: "wrote a thing".to_string(),
            introduction: String::new(),
            display_name: String::new(),
            blog_title: String::new(),
            icon: String::new(),
        };
        let session_user = SessionUser::new(user(), Some(profile));
        assert_eq!(session_user.display_name, "alice");
        assert_eq!(session_user.blog_title, "alice's Blog");
        assert_eq!(session_user.bio, "wrote a thing");
        assert_eq!(session_user.icon, DEFAULT_ICON);
    }
}
