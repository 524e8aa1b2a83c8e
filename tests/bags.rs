mod common;

use axum::http::StatusCode;
use bagroom::models::BagLocation;
use chrono::Duration;
use common::{assert_hx_redirect, assert_redirect, body_string, TestApp};

#[tokio::test]
async fn create_bag_with_valid_form() {
    let app = TestApp::new().await;
    let (club, cookie) = app.login_club("pine").await;

    let body = "member_name=Ike+Eisen&membership_id=M-7&bag_number=42&location=player&notes=Blue+staff+bag";
    let resp = app.post_form("/bags", body, Some(&cookie)).await;
    assert_redirect(&resp, "/bags");

    let user = club.user_id();
    let bags = app.state.stores.bags.bags(&user);
    assert_eq!(bags.len(), 1);
    assert_eq!(bags[0].bag_number, "42");
    assert_eq!(bags[0].location, BagLocation::Player);
    assert_eq!(bags[0].notes.as_deref(), Some("Blue staff bag"));
    let member = app.state.stores.bags.get_member_by_id(&user, &bags[0].member_id).unwrap();
    assert_eq!(member.name, "Ike Eisen");

    let resp = app.get("/bags", Some(&cookie)).await;
    let html = body_string(resp).await;
    assert!(html.contains("Ike Eisen"));
    assert!(html.contains("#42"));
}

#[tokio::test]
async fn create_bag_with_missing_fields_shows_error() {
    let app = TestApp::new().await;
    let (club, cookie) = app.login_club("pine").await;

    let body = "member_name=&membership_id=&bag_number=42&location=bagroom&notes=";
    let resp = app.post_form("/bags", body, Some(&cookie)).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("Please fill in all required fields"));
    assert!(app.state.stores.bags.bags(&club.user_id()).is_empty());
}

#[tokio::test]
async fn list_filters_by_location_and_search() {
    let app = TestApp::new().await;
    let (club, cookie) = app.login_club("pine").await;
    app.seed_bag(&club, "Ann Archer", "101", BagLocation::Bagroom);
    app.seed_bag(&club, "Bob Birdie", "102", BagLocation::Course);

    let resp = app.get("/bags?location=course", Some(&cookie)).await;
    let html = body_string(resp).await;
    assert!(html.contains("Bob Birdie"));
    assert!(!html.contains("Ann Archer"));

    let resp = app.get("/bags?q=archer", Some(&cookie)).await;
    let html = body_string(resp).await;
    assert!(html.contains("Ann Archer"));
    assert!(!html.contains("Bob Birdie"));
}

#[tokio::test]
async fn move_bag_updates_location_and_timestamp() {
    let app = TestApp::new().await;
    let (club, cookie) = app.login_club("pine").await;
    let bag = app.seed_bag(&club, "Ann Archer", "101", BagLocation::Bagroom);

    app.clock.advance(Duration::minutes(5));
    let resp = app
        .post_form(&format!("/bags/{}/location", bag.id), "location=course", Some(&cookie))
        .await;
    assert_redirect(&resp, &format!("/bags/{}", bag.id));

    let moved = app.state.stores.bags.get_bag_by_id(&club.user_id(), &bag.id).unwrap();
    assert_eq!(moved.location, BagLocation::Course);
    assert!(moved.last_updated > bag.last_updated);
}

#[tokio::test]
async fn star_toggle_shows_on_dashboard() {
    let app = TestApp::new().await;
    let (club, cookie) = app.login_club("pine").await;
    let bag = app.seed_bag(&club, "Ann Archer", "101", BagLocation::Bagroom);

    let resp = app.post_form(&format!("/bags/{}/star", bag.id), "", Some(&cookie)).await;
    assert_redirect(&resp, &format!("/bags/{}", bag.id));
    assert!(app.state.stores.bags.is_bag_starred(&club.user_id(), &bag.id));

    let resp = app.get("/", Some(&cookie)).await;
    let html = body_string(resp).await;
    assert!(html.contains("Ann Archer"));

    app.post_form(&format!("/bags/{}/star", bag.id), "", Some(&cookie)).await;
    assert!(!app.state.stores.bags.is_bag_starred(&club.user_id(), &bag.id));
}

#[tokio::test]
async fn update_notes() {
    let app = TestApp::new().await;
    let (club, cookie) = app.login_club("pine").await;
    let bag = app.seed_bag(&club, "Ann Archer", "101", BagLocation::Bagroom);

    let resp = app
        .post_form(&format!("/bags/{}/notes", bag.id), "notes=Needs+new+rain+hood", Some(&cookie))
        .await;
    assert_redirect(&resp, &format!("/bags/{}", bag.id));

    let resp = app.get(&format!("/bags/{}", bag.id), Some(&cookie)).await;
    let html = body_string(resp).await;
    assert!(html.contains("Needs new rain hood"));
}

#[tokio::test]
async fn delete_bag_returns_hx_redirect() {
    let app = TestApp::new().await;
    let (club, cookie) = app.login_club("pine").await;
    let bag = app.seed_bag(&club, "Ann Archer", "101", BagLocation::Bagroom);
    app.post_form(&format!("/bags/{}/star", bag.id), "", Some(&cookie)).await;

    let resp = app.delete(&format!("/bags/{}", bag.id), Some(&cookie)).await;
    assert_hx_redirect(&resp, "/bags");

    let user = club.user_id();
    assert!(app.state.stores.bags.get_bag_by_id(&user, &bag.id).is_none());
    assert!(!app.state.stores.bags.is_bag_starred(&user, &bag.id));
}

#[tokio::test]
async fn unknown_bag_is_not_found() {
    let app = TestApp::new().await;
    let (_club, cookie) = app.login_club("pine").await;

    let resp = app.get("/bags/nope", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app.post_form("/bags/nope/location", "location=course", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn clubs_cannot_see_each_others_bags() {
    let app = TestApp::new().await;
    let (pine, _pine_cookie) = app.login_club("pine").await;
    let (_oak, oak_cookie) = app.login_club("oak").await;
    let bag = app.seed_bag(&pine, "Ann Archer", "101", BagLocation::Bagroom);

    let resp = app.get(&format!("/bags/{}", bag.id), Some(&oak_cookie)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app.get("/bags", Some(&oak_cookie)).await;
    let html = body_string(resp).await;
    assert!(!html.contains("Ann Archer"));

    app.delete(&format!("/bags/{}", bag.id), Some(&oak_cookie)).await;
    assert!(app.state.stores.bags.get_bag_by_id(&pine.user_id(), &bag.id).is_some());
}

#[tokio::test]
async fn member_page_lists_their_bags() {
    let app = TestApp::new().await;
    let (club, cookie) = app.login_club("pine").await;
    let bag = app.seed_bag(&club, "Ann Archer", "101", BagLocation::Course);

    let resp = app.get(&format!("/members/{}", bag.member_id), Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("Ann Archer"));
    assert!(html.contains("#101"));
    assert!(html.contains("On Course"));
}
