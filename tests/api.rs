//! End-to-end tests: each test boots the full router with its own SQLite
//! database on a random port and drives it over HTTP, cookies included.

use std::net::TcpListener;
use std::time::Duration;

use inkpost::{init_db_at, make_router, with_state};
use serde_json::Value;
use tempfile::TempPath;

struct TestApp {
    base: String,
    _db: TempPath,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

async fn spawn_app() -> TestApp {
    let db_file = tempfile::NamedTempFile::new().unwrap();
    let db_path = db_file.into_temp_path();
    let db_url = format!("sqlite://{}", db_path.to_str().unwrap());
    let pool = init_db_at(&db_url).await.unwrap();
    let app = with_state(make_router(), pool);

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::Server::from_tcp(listener)
            .unwrap()
            .serve(app.into_make_service())
            .await
            .unwrap();
    });

    TestApp {
        base: format!("http://{}", addr),
        _db: db_path,
    }
}

/// Redirects are assertions here, so the client never follows them.
fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

async fn register(
    app: &TestApp,
    client: &reqwest::Client,
    username: &str,
    email: &str,
    password: &str,
) -> reqwest::Response {
    client
        .post(app.url("/add_user"))
        .form(&[
            ("username", username),
            ("email", email),
            ("password", password),
        ])
        .send()
        .await
        .unwrap()
}

async fn login(
    app: &TestApp,
    client: &reqwest::Client,
    identifier: &str,
    password: &str,
) -> reqwest::Response {
    client
        .post(app.url("/login"))
        .form(&[("usernameOrEmail", identifier), ("password", password)])
        .send()
        .await
        .unwrap()
}

async fn register_and_login(
    app: &TestApp,
    client: &reqwest::Client,
    username: &str,
    email: &str,
    password: &str,
) {
    let response = register(app, client, username, email, password).await;
    assert_eq!(response.status().as_u16(), 303);
    let response = login(app, client, username, password).await;
    assert_eq!(response.status().as_u16(), 303);
    assert_eq!(response.headers()["location"], "/profile");
}

/// Creates a draft through the form and digs its id out of the profile page.
async fn create_article(app: &TestApp, client: &reqwest::Client, title: &str, content: &str) -> i64 {
    let response = client
        .post(app.url("/profile/new_article"))
        .form(&[("title", title), ("content", content)])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 303);

    let profile: Value = client
        .get(app.url("/profile"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    profile["articles"]
        .as_array()
        .unwrap()
        .iter()
        .find(|article| article["title"] == title)
        .expect("created article missing from profile listing")["id"]
        .as_i64()
        .unwrap()
}

async fn fetch_article(app: &TestApp, client: &reqwest::Client, article_id: i64) -> Value {
    client
        .get(app.url(&format!("/profile/article/{}", article_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

// ----------------- Identity & Session -----------------

#[tokio::test]
async fn register_then_login_sets_up_the_session() {
    let app = spawn_app().await;
    let client = client();

    let response = register(&app, &client, "alice", "alice@example.com", "p1").await;
    assert_eq!(response.status().as_u16(), 303);
    assert_eq!(response.headers()["location"], "/login");

    let response = login(&app, &client, "alice", "p1").await;
    assert_eq!(response.status().as_u16(), 303);
    assert_eq!(response.headers()["location"], "/profile");

    let info: Value = client
        .get(app.url("/session-info"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(info["authenticated"], true);
    assert_eq!(info["username"], "alice");
    assert_eq!(info["displayName"], "alice");
    assert_eq!(info["blogTitle"], "alice's Blog");
    assert!(info["userId"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn login_by_email_works_too() {
    let app = spawn_app().await;
    let client = client();
    let response = register(&app, &client, "alice", "alice@example.com", "p1").await;
    assert_eq!(response.status().as_u16(), 303);

    let response = login(&app, &client, "alice@example.com", "p1").await;
    assert_eq!(response.status().as_u16(), 303);
}

#[tokio::test]
async fn login_failures_are_undifferentiated() {
    let app = spawn_app().await;
    let client = client();
    let response = register(&app, &client, "alice", "alice@example.com", "p1").await;
    assert_eq!(response.status().as_u16(), 303);

    let wrong_password = login(&app, &client, "alice", "nope").await;
    assert_eq!(wrong_password.status().as_u16(), 401);
    let wrong_password: Value = wrong_password.json().await.unwrap();

    let unknown_user = login(&app, &client, "nobody", "nope").await;
    assert_eq!(unknown_user.status().as_u16(), 401);
    let unknown_user: Value = unknown_user.json().await.unwrap();

    assert_eq!(
        wrong_password["errorMessage"],
        "Invalid username/email or password"
    );
    assert_eq!(wrong_password["errorMessage"], unknown_user["errorMessage"]);

    let info: Value = client
        .get(app.url("/session-info"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(info["authenticated"], false);
}

#[tokio::test]
async fn duplicate_registration_conflicts_without_side_effects() {
    let app = spawn_app().await;
    let client = client();
    let response = register(&app, &client, "alice", "alice@example.com", "p1").await;
    assert_eq!(response.status().as_u16(), 303);

    // Same username and email: the username match is reported first.
    let response = register(&app, &client, "alice", "alice@example.com", "p2").await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Username already exists");

    // Same username, fresh email: rejected, and the fresh email must not
    // have been claimed by the failed attempt.
    let response = register(&app, &client, "alice", "other@example.com", "p2").await;
    assert_eq!(response.status().as_u16(), 400);
    let probe: Value = client
        .get(app.url("/check-email"))
        .query(&[("email", "other@example.com")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(probe["exists"], false);

    // Fresh username, same email.
    let response = register(&app, &client, "bob", "alice@example.com", "p2").await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Email already exists");
    let probe: Value = client
        .get(app.url("/check-username"))
        .query(&[("username", "bob")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(probe["exists"], false);
}

#[tokio::test]
async fn existence_probes_answer_plainly() {
    let app = spawn_app().await;
    let client = client();
    let response = register(&app, &client, "alice", "alice@example.com", "p1").await;
    assert_eq!(response.status().as_u16(), 303);

    let probe: Value = client
        .get(app.url("/check-username"))
        .query(&[("username", "alice")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(probe["exists"], true);

    let probe: Value = client
        .get(app.url("/check-username"))
        .query(&[("username", "carol")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(probe["exists"], false);
}

#[tokio::test]
async fn gated_routes_redirect_to_login() {
    let app = spawn_app().await;
    let client = client();

    for path in ["/profile", "/profile/settings", "/profile/new_article"] {
        let response = client.get(app.url(path)).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 303, "GET {}", path);
        assert_eq!(response.headers()["location"], "/login");
    }

    let response = client
        .post(app.url("/profile/article/publish/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 303);
    assert_eq!(response.headers()["location"], "/login");
}

#[tokio::test]
async fn logout_destroys_the_session() {
    let app = spawn_app().await;
    let client = client();
    register_and_login(&app, &client, "alice", "alice@example.com", "p1").await;

    let response = client.post(app.url("/logout")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 303);
    assert_eq!(response.headers()["location"], "/login");

    let response = client.get(app.url("/profile")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 303);
}

// ----------------- Settings -----------------

#[tokio::test]
async fn settings_update_refreshes_the_session_cache() {
    let app = spawn_app().await;
    let client = client();
    register_and_login(&app, &client, "alice", "alice@example.com", "p1").await;

    let response = client
        .post(app.url("/profile/settings"))
        .form(&[
            ("username", "alice"),
            ("email", "alice@example.com"),
            ("password", ""),
            ("blogTitle", "Field Notes"),
            ("displayName", "Alice A."),
            ("introduction", "Hello there"),
            ("bio", "Writes about databases"),
            ("icon", "alice.png"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 303);
    assert_eq!(response.headers()["location"], "/profile");

    let info: Value = client
        .get(app.url("/session-info"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(info["displayName"], "Alice A.");
    assert_eq!(info["blogTitle"], "Field Notes");
    assert_eq!(info["icon"], "alice.png");

    let profile: Value = client
        .get(app.url("/profile"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["blogTitle"], "Field Notes");

    let settings: Value = client
        .get(app.url("/profile/settings"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(settings["bio"], "Writes about databases");
}

#[tokio::test]
async fn password_change_takes_effect_and_is_checkable() {
    let app = spawn_app().await;
    let client = client();
    register_and_login(&app, &client, "alice", "alice@example.com", "p1").await;

    let check: Value = client
        .get(app.url("/profile/check-password"))
        .query(&[("password", "p1")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(check["valid"], true);

    let response = client
        .post(app.url("/profile/settings"))
        .form(&[
            ("username", "alice"),
            ("email", "alice@example.com"),
            ("password", "p2"),
            ("blogTitle", "alice's Blog"),
            ("displayName", "alice"),
            ("introduction", "No introduction available."),
            ("bio", "No bio available."),
            ("icon", "user.png"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 303);

    let check: Value = client
        .get(app.url("/profile/check-password"))
        .query(&[("password", "p1")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(check["valid"], false);

    let response = client.post(app.url("/logout")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 303);
    let response = login(&app, &client, "alice", "p1").await;
    assert_eq!(response.status().as_u16(), 401);
    let response = login(&app, &client, "alice", "p2").await;
    assert_eq!(response.status().as_u16(), 303);
}

// ----------------- Article Lifecycle -----------------

#[tokio::test]
async fn drafts_stay_out_of_the_reader_until_published() {
    let app = spawn_app().await;
    let client = client();
    register_and_login(&app, &client, "alice", "alice@example.com", "p1").await;
    let article_id = create_article(&app, &client, "T", "C").await;

    let reader: Value = client
        .get(app.url("/reader"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(reader["blogs"].as_array().unwrap().is_empty());

    let profile: Value = client
        .get(app.url("/profile"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let listed = &profile["articles"][0];
    assert_eq!(listed["status"], "draft");
    assert_eq!(listed["publishedDate"], "Not published");

    let response = client
        .post(app.url(&format!("/profile/article/publish/{}", article_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let reader: Value = client
        .get(app.url("/reader"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let blogs = reader["blogs"].as_array().unwrap();
    assert_eq!(blogs.len(), 1);
    assert_eq!(blogs[0]["title"], "T");
    assert_eq!(blogs[0]["author"], "alice");
    assert_eq!(blogs[0]["status"], "published");
    assert_ne!(blogs[0]["publishedDate"], "Not published");
}

#[tokio::test]
async fn edit_round_trip_updates_content_and_modified_date() {
    let app = spawn_app().await;
    let client = client();
    register_and_login(&app, &client, "alice", "alice@example.com", "p1").await;
    let article_id = create_article(&app, &client, "Original title", "Original content").await;

    // Stored timestamps have one-second resolution.
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let response = client
        .post(app.url(&format!("/profile/article/edit/{}", article_id)))
        .form(&[("title", "Edited title"), ("content", "Edited content")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 303);

    let page = fetch_article(&app, &client, article_id).await;
    let article = &page["article"];
    assert_eq!(article["title"], "Edited title");
    assert_eq!(article["content"], "Edited content");
    assert_eq!(article["status"], "draft");
    let created = article["createdDate"].as_str().unwrap();
    let modified = article["modifiedDate"].as_str().unwrap();
    assert_ne!(modified, "Not modified");
    // Timestamps format as "YYYY-MM-DD HH:MM:SS", so they compare as strings.
    assert!(modified > created, "{} should be after {}", modified, created);
}

#[tokio::test]
async fn edit_page_serves_the_current_draft() {
    let app = spawn_app().await;
    let client = client();
    register_and_login(&app, &client, "alice", "alice@example.com", "p1").await;
    let article_id = create_article(&app, &client, "T", "C").await;

    let page: Value = client
        .get(app.url(&format!("/profile/article/edit/{}", article_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["article"]["title"], "T");
    assert_eq!(page["article"]["content"], "C");
    assert_eq!(page["article"]["publishedDate"], "Not published");
}

#[tokio::test]
async fn delete_removes_the_article_then_reports_not_found() {
    let app = spawn_app().await;
    let client = client();
    register_and_login(&app, &client, "alice", "alice@example.com", "p1").await;
    let article_id = create_article(&app, &client, "T", "C").await;

    let response = client
        .delete(app.url(&format!("/profile/article/{}", article_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let profile: Value = client
        .get(app.url("/profile"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(profile["articles"].as_array().unwrap().is_empty());

    // A zero-row delete is not silent success.
    let response = client
        .delete(app.url(&format!("/profile/article/{}", article_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn authors_cannot_touch_each_others_articles() {
    let app = spawn_app().await;
    let alice = client();
    register_and_login(&app, &alice, "alice", "alice@example.com", "p1").await;
    let article_id = create_article(&app, &alice, "T", "C").await;

    let bob = client();
    register_and_login(&app, &bob, "bob", "bob@example.com", "p2").await;

    let response = bob
        .post(app.url(&format!("/profile/article/publish/{}", article_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = bob
        .post(app.url(&format!("/profile/article/edit/{}", article_id)))
        .form(&[("title", "Hijacked"), ("content", "X")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = bob
        .get(app.url(&format!("/profile/article/edit/{}", article_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = bob
        .delete(app.url(&format!("/profile/article/{}", article_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    // The article is untouched.
    let page = fetch_article(&app, &alice, article_id).await;
    assert_eq!(page["article"]["title"], "T");

    // A missing id is NotFound, not Forbidden.
    let response = bob
        .delete(app.url("/profile/article/999999"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn invalid_sort_keys_fall_back_silently() {
    let app = spawn_app().await;
    let client = client();
    register_and_login(&app, &client, "alice", "alice@example.com", "p1").await;
    create_article(&app, &client, "T", "C").await;

    let profile: Value = client
        .get(app.url("/profile"))
        .query(&[("sortBy", "nonsense"), ("sortOrder", "sideways")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["sortBy"], "publishedDate");
    assert_eq!(profile["sortOrder"], "DESC");

    // status is a valid profile sort but not a reader sort.
    let profile: Value = client
        .get(app.url("/profile"))
        .query(&[("sortBy", "status"), ("sortOrder", "asc")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["sortBy"], "status");
    assert_eq!(profile["sortOrder"], "ASC");

    let reader: Value = client
        .get(app.url("/reader"))
        .query(&[("sortBy", "status")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reader["sortBy"], "publishedDate");
}

// ----------------- Engagement -----------------

#[tokio::test]
async fn second_like_is_rejected_and_count_stays_at_one() {
    let app = spawn_app().await;
    let client = client();
    register_and_login(&app, &client, "alice", "alice@example.com", "p1").await;
    let article_id = create_article(&app, &client, "T", "C").await;

    let response = client
        .post(app.url(&format!("/article/like/{}", article_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["likeCount"], 1);

    let response = client
        .post(app.url(&format!("/article/like/{}", article_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Already liked");

    let page = fetch_article(&app, &client, article_id).await;
    assert_eq!(page["article"]["likeCount"], 1);
}

#[tokio::test]
async fn concurrent_likes_from_one_user_count_once() {
    let app = spawn_app().await;
    let client = client();
    register_and_login(&app, &client, "alice", "alice@example.com", "p1").await;
    let article_id = create_article(&app, &client, "T", "C").await;

    let url = app.url(&format!("/article/like/{}", article_id));
    let (first, second) = tokio::join!(
        client.post(url.as_str()).send(),
        client.post(url.as_str()).send()
    );
    let mut statuses = [
        first.unwrap().status().as_u16(),
        second.unwrap().status().as_u16(),
    ];
    statuses.sort_unstable();
    assert_eq!(statuses, [200, 400]);

    let page = fetch_article(&app, &client, article_id).await;
    assert_eq!(page["article"]["likeCount"], 1);
}

#[tokio::test]
async fn liking_a_missing_article_is_not_found() {
    let app = spawn_app().await;
    let client = client();
    register_and_login(&app, &client, "alice", "alice@example.com", "p1").await;

    let response = client
        .post(app.url("/article/like/424242"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn comments_attach_to_the_article() {
    let app = spawn_app().await;
    let client = client();
    register_and_login(&app, &client, "alice", "alice@example.com", "p1").await;
    let article_id = create_article(&app, &client, "T", "C").await;

    let response = client
        .post(app.url(&format!("/profile/article/{}/comment", article_id)))
        .form(&[("comment", "Nice one")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 303);
    assert_eq!(
        response.headers()["location"],
        format!("/profile/article/{}", article_id)
    );

    let page = fetch_article(&app, &client, article_id).await;
    let comments = page["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["username"], "alice");
    assert_eq!(comments[0]["body"], "Nice one");
    assert_eq!(comments[0]["icon"], "user.png");

    let response = client
        .post(app.url("/profile/article/424242/comment"))
        .form(&[("comment", "Into the void")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn every_detail_view_bumps_the_read_count() {
    let app = spawn_app().await;
    let client = client();
    register_and_login(&app, &client, "alice", "alice@example.com", "p1").await;
    let article_id = create_article(&app, &client, "T", "C").await;

    let page = fetch_article(&app, &client, article_id).await;
    assert_eq!(page["article"]["readCount"], 1);
    let page = fetch_article(&app, &client, article_id).await;
    assert_eq!(page["article"]["readCount"], 2);

    let response = client
        .get(app.url("/profile/article/424242"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}
