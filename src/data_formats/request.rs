use serde::{Deserialize, Serialize};

// ----------------- Auth Forms -----------------
#[derive(Deserialize, Serialize, Debug)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct LoginForm {
    #[serde(rename = "usernameOrEmail")]
    pub username_or_email: String,
    pub password: String,
}

// ----------------- Profile Forms -----------------
#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SettingsForm {
    pub username: String,
    pub email: String,
    /// Blank means "keep the stored password".
    #[serde(default)]
    pub password: String,
    pub blog_title: String,
    pub display_name: String,
    pub introduction: String,
    pub bio: String,
    pub icon: String,
}

// ----------------- Article Forms -----------------
#[derive(Deserialize, Serialize, Debug)]
pub struct ArticleForm {
    pub title: String,
    pub content: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct CommentForm {
    pub comment: String,
}

// ----------------- Query Probes -----------------
#[derive(Deserialize, Debug)]
pub struct UsernameQuery {
    pub username: String,
}

#[derive(Deserialize, Debug)]
pub struct EmailQuery {
    pub email: String,
}

#[derive(Deserialize, Debug)]
pub struct PasswordQuery {
    pub password: String,
}
