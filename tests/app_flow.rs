//! End-to-end flows through the real routes, templates and SQLite storage.

mod common;

use std::sync::Arc;

use axum::http::{header, StatusCode};
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;

use common::{settings, ui_dir, Browser};
use courtside::migration::Migrator;
use courtside::models::{TennisSessionModel, UserModel};
use courtside::store::SeaOrmStore;
use courtside::templates::{Helpers, TemplateCache};
use courtside::web::{self, AppState};

async fn browser() -> Browser {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    let templates = TemplateCache::build(ui_dir().join("html"), &Helpers::standard()).unwrap();
    let state = AppState::new(
        Arc::new(UserModel::new(db.clone())),
        Arc::new(TennisSessionModel::new(db.clone())),
        Arc::new(templates),
    );
    let app = web::app(state, SeaOrmStore::new(db), &settings(), ui_dir().join("static"));
    Browser::new(app)
}

async fn sign_up(browser: &mut Browser, name: &str, email: &str, password: &str) -> common::Page {
    let token = browser.get("/user/signup").await.csrf_token();
    browser
        .post_form(
            "/user/signup",
            &[
                ("name", name),
                ("email", email),
                ("password", password),
                ("csrf_token", &token),
            ],
        )
        .await
}

async fn log_in(browser: &mut Browser, email: &str, password: &str) -> common::Page {
    let token = browser.get("/user/login").await.csrf_token();
    browser
        .post_form(
            "/user/login",
            &[("email", email), ("password", password), ("csrf_token", &token)],
        )
        .await
}

#[tokio::test]
async fn signup_login_create_and_show() {
    let mut browser = browser().await;

    let page = sign_up(&mut browser, "Alice", "alice@example.com", "correct horse battery").await;
    assert_eq!(page.status(), StatusCode::SEE_OTHER);
    assert_eq!(page.header(header::LOCATION), Some("/user/login"));

    // The flash shows on the next page only.
    let page = browser.get("/user/login").await;
    assert!(page.body.contains("Your signup was successful. Please log in."));
    let page = browser.get("/user/login").await;
    assert!(!page.body.contains("Your signup was successful"));

    let session_before = browser.jar.get("session").map(str::to_owned);
    let page = log_in(&mut browser, "alice@example.com", "correct horse battery").await;
    assert_eq!(page.status(), StatusCode::SEE_OTHER);
    assert_eq!(page.header(header::LOCATION), Some("/session/create"));
    assert_ne!(browser.jar.get("session").map(str::to_owned), session_before);

    let page = browser.get("/session/create").await;
    assert_eq!(page.status(), StatusCode::OK);
    assert!(page.body.contains("Logout (Alice)"));
    assert_eq!(page.header(header::CACHE_CONTROL), Some("no-store"));

    let token = page.csrf_token();
    let page = browser
        .post_form(
            "/session/create",
            &[
                ("title", "Saturday doubles"),
                ("content", "Court 3, bring balls"),
                ("expires", "7"),
                ("csrf_token", &token),
            ],
        )
        .await;
    assert_eq!(page.status(), StatusCode::SEE_OTHER);
    assert_eq!(page.header(header::LOCATION), Some("/session/1"));

    let page = browser.get("/session/1").await;
    assert_eq!(page.status(), StatusCode::OK);
    assert!(page.body.contains("Saturday doubles"));
    assert!(page.body.contains("Tennis session successfully created!"));

    let page = browser.get("/").await;
    assert!(page.body.contains(r#"<a href="/session/1">Saturday doubles</a>"#));
}

#[tokio::test]
async fn invalid_tennis_session_form_is_rerendered_with_errors() {
    let mut browser = browser().await;
    sign_up(&mut browser, "Bob", "bob@example.com", "a long password").await;
    log_in(&mut browser, "bob@example.com", "a long password").await;

    let token = browser.get("/session/create").await.csrf_token();
    let page = browser
        .post_form(
            "/session/create",
            &[
                ("title", "Kept title"),
                ("content", ""),
                ("expires", "30"),
                ("csrf_token", &token),
            ],
        )
        .await;

    assert_eq!(page.status(), StatusCode::OK);
    assert!(page.body.contains("This field cannot be blank"));
    assert!(page.body.contains("This field is invalid"));
    assert!(page.body.contains(r#"value="Kept title""#));
}

#[tokio::test]
async fn duplicate_email_is_reported_on_the_form() {
    let mut browser = browser().await;
    sign_up(&mut browser, "Carol", "carol@example.com", "first password").await;

    let page = sign_up(&mut browser, "Carol Two", "carol@example.com", "second password").await;
    assert_eq!(page.status(), StatusCode::OK);
    assert!(page.body.contains("Address is already in use"));
}

#[tokio::test]
async fn signup_validation_errors() {
    let mut browser = browser().await;
    let page = sign_up(&mut browser, "", "not-an-email", "short").await;

    assert_eq!(page.status(), StatusCode::OK);
    assert!(page.body.contains("This field cannot be blank"));
    assert!(page.body.contains("This field is invalid"));
    assert!(page.body.contains("This field is too short (minimum is 10 characters)"));
}

#[tokio::test]
async fn wrong_password_shows_generic_error() {
    let mut browser = browser().await;
    sign_up(&mut browser, "Dan", "dan@example.com", "the right password").await;

    let page = log_in(&mut browser, "dan@example.com", "the wrong password").await;
    assert_eq!(page.status(), StatusCode::OK);
    assert!(page.body.contains("Email or Password is incorrect"));
    assert!(page.body.contains(r#"value="dan@example.com""#));
}

#[tokio::test]
async fn logout_clears_the_user() {
    let mut browser = browser().await;
    sign_up(&mut browser, "Eve", "eve@example.com", "eve's password").await;
    log_in(&mut browser, "eve@example.com", "eve's password").await;

    let token = browser.get("/session/create").await.csrf_token();
    let page = browser.post_form("/user/logout", &[("csrf_token", &token)]).await;
    assert_eq!(page.status(), StatusCode::SEE_OTHER);
    assert_eq!(page.header(header::LOCATION), Some("/"));

    let page = browser.get("/").await;
    assert!(page.body.contains("You&#x27;ve been logged out successfully!"));
    assert!(page.body.contains("Login"));

    let page = browser.get("/session/create").await;
    assert_eq!(page.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn protected_pages_redirect_anonymous_users() {
    let mut browser = browser().await;
    let page = browser.get("/session/create").await;

    assert_eq!(page.status(), StatusCode::FOUND);
    assert_eq!(page.header(header::LOCATION), Some("/user/login"));
}

#[tokio::test]
async fn unknown_and_malformed_ids_are_not_found() {
    let mut browser = browser().await;

    for uri in ["/session/abc", "/session/0", "/session/-3", "/session/999", "/no/such/page"] {
        let page = browser.get(uri).await;
        assert_eq!(page.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(page.body, "Not Found");
    }
}

#[tokio::test]
async fn wrong_method_is_not_allowed() {
    let mut browser = browser().await;
    let token = browser.get("/user/login").await.csrf_token();

    let page = browser.post_form("/", &[("csrf_token", &token)]).await;
    assert_eq!(page.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(page.header(header::ALLOW).is_some());
}

#[tokio::test]
async fn home_page_lists_nothing_yet() {
    let mut browser = browser().await;
    let page = browser.get("/").await;

    assert_eq!(page.status(), StatusCode::OK);
    assert!(page.body.contains("There's nothing to see here... yet!"));
    assert!(browser.jar.get("csrf_token").is_some());
}

#[tokio::test]
async fn stylesheet_is_served() {
    let mut browser = browser().await;
    let page = browser.get("/static/css/main.css").await;

    assert_eq!(page.status(), StatusCode::OK);
    assert!(page.body.contains("font-family"));
}
