mod common;

use axum::http::StatusCode;
use chrono::Duration;
use common::{assert_hx_redirect, assert_redirect, body_string, TestApp};

#[tokio::test]
async fn owner_dashboard_lists_clubs() {
    let app = TestApp::new().await;
    app.create_club("pine");
    let cookie = app.login_owner().await;

    let resp = app.get("/owner", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("pine Golf Club"));
    assert!(html.contains("Trial"));
}

#[tokio::test]
async fn owner_creates_club_account() {
    let app = TestApp::new().await;
    let cookie = app.login_owner().await;

    let body = "club_name=Oak+Hill&email=pro%40oak.golf&username=oak&password=secret1";
    let resp = app.post_form("/owner/accounts", body, Some(&cookie)).await;
    assert_redirect(&resp, "/owner");

    let resp = app.post_form("/login", "username=oak&password=secret1", None).await;
    assert_redirect(&resp, "/");
}

#[tokio::test]
async fn owner_create_with_missing_fields() {
    let app = TestApp::new().await;
    let cookie = app.login_owner().await;

    let resp = app
        .post_form("/owner/accounts", "club_name=&email=&username=oak&password=", Some(&cookie))
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("Please fill in all fields"));
}

#[tokio::test]
async fn owner_create_with_taken_username() {
    let app = TestApp::new().await;
    app.create_club("pine");
    let cookie = app.login_owner().await;

    let body = "club_name=Dup&email=dup%40pine.golf&username=pine&password=secret1";
    let resp = app.post_form("/owner/accounts", body, Some(&cookie)).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("Username already exists or invalid data"));
}

#[tokio::test]
async fn owner_deletes_club_account() {
    let app = TestApp::new().await;
    let club = app.create_club("pine");
    let cookie = app.login_owner().await;

    let resp = app.delete(&format!("/owner/accounts/{}", club.id), Some(&cookie)).await;
    assert_hx_redirect(&resp, "/owner");
    assert!(app.state.stores.auth.find_account(&club.id).is_none());
}

#[tokio::test]
async fn clubs_cannot_reach_owner_pages() {
    let app = TestApp::new().await;
    let (club, cookie) = app.login_club("pine").await;

    let resp = app.get("/owner", Some(&cookie)).await;
    assert_redirect(&resp, "/login");

    let resp = app.delete(&format!("/owner/accounts/{}", club.id), Some(&cookie)).await;
    assert_redirect(&resp, "/login");
    assert!(app.state.stores.auth.find_account(&club.id).is_some());
}

#[tokio::test]
async fn owner_is_never_gated() {
    let app = TestApp::new().await;
    let cookie = app.login_owner().await;
    app.clock.advance(Duration::days(3650));

    let resp = app.get("/bags", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.get("/subscription", Some(&cookie)).await;
    assert_redirect(&resp, "/owner");
}
