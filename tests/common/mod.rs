#![allow(dead_code)]

use axum::body::Body;
use http_body_util::BodyExt;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use bagroom::clock::ManualClock;
use bagroom::models::{Account, Bag, BagLocation, Member};
use bagroom::store::auth::owner_account;
use bagroom::AppState;
use chrono::{TimeZone, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub const OWNER_USERNAME: &str = "TheBagroomCaddy";
pub const OWNER_PASSWORD: &str = "Ikesplace1";
pub const CLUB_PASSWORD: &str = "secret1";

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
    pub state: AppState,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    pub async fn new() -> Self {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("Failed to create in-memory SQLite pool");

        Self::with_pool(pool).await
    }

    /// Boot the app over an already-populated pool, as after a restart.
    pub async fn with_pool(pool: SqlitePool) -> Self {
        bagroom::db::migrate(&pool)
            .await
            .expect("Failed to run migrations");

        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap()));
        let state = AppState::load(pool.clone(), clock.clone(), Duration::ZERO)
            .await
            .expect("Failed to load stores");

        let router = bagroom::build_app(state.clone(), false)
            .await
            .expect("Failed to build app");

        Self {
            router,
            db: pool,
            state,
            clock,
        }
    }

    /// Send a request through the app and return the response.
    pub async fn request(&self, req: Request<Body>) -> Response {
        tower::ServiceExt::oneshot(self.router.clone(), req)
            .await
            .unwrap()
    }

    /// Create a club account through the owner API and return it.
    pub fn create_club(&self, username: &str) -> Account {
        let created = self.state.stores.auth.create_club_account(
            &owner_account(),
            &format!("{}@club.test", username),
            username,
            CLUB_PASSWORD,
            &format!("{} Golf Club", username),
        );
        assert!(created, "club account should be created");

        let club = self
            .state
            .stores
            .auth
            .club_accounts()
            .into_iter()
            .find(|a| a.username == username)
            .unwrap();
        self.state.stores.auth.find_account(&club.id).unwrap()
    }

    /// Put a member and their bag straight into the partition of `account`.
    pub fn seed_bag(&self, account: &Account, name: &str, bag_number: &str, location: BagLocation) -> Bag {
        let user = account.user_id();
        let member = Member::new(name.to_string(), format!("M-{}", bag_number));
        let bag = Bag::new(member.id.clone(), bag_number.to_string(), location, self.clock_now());
        self.state.stores.bags.add_member(&user, member);
        self.state.stores.bags.add_bag(&user, bag.clone());
        bag
    }

    pub fn clock_now(&self) -> chrono::DateTime<Utc> {
        bagroom::clock::Clock::now(self.clock.as_ref())
    }

    /// Log in with the given credentials and return the session cookie string.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let resp = self
            .post_form("/login", &format!("username={}&password={}", username, password), None)
            .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        resp.headers()
            .get("set-cookie")
            .expect("Login should set a session cookie")
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }

    pub async fn login_owner(&self) -> String {
        self.login(OWNER_USERNAME, OWNER_PASSWORD).await
    }

    /// Create a club and log in as it.
    pub async fn login_club(&self, username: &str) -> (Account, String) {
        let account = self.create_club(username);
        let cookie = self.login(username, CLUB_PASSWORD).await;
        (account, cookie)
    }

    /// Send a GET request with an optional session cookie.
    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let req = builder.body(Body::empty()).unwrap();
        self.request(req).await
    }

    /// Send a POST form request with an optional session cookie.
    pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .uri(uri)
            .method("POST")
            .header("content-type", "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let req = builder.body(Body::from(body.to_string())).unwrap();
        self.request(req).await
    }

    /// Send a DELETE request with an optional session cookie.
    pub async fn delete(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri).method("DELETE");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let req = builder.body(Body::empty()).unwrap();
        self.request(req).await
    }
}

/// Read the full response body as a String.
pub async fn body_string(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Assert that a response is a redirect to the given location.
pub fn assert_redirect(resp: &Response, expected_location: &str) {
    assert!(
        resp.status().is_redirection(),
        "Expected redirect, got {}",
        resp.status()
    );
    let location = resp
        .headers()
        .get("location")
        .expect("Redirect should have location header")
        .to_str()
        .unwrap();
    assert_eq!(location, expected_location);
}

/// Assert that an HX-Redirect header points to the expected location.
pub fn assert_hx_redirect(resp: &Response, expected_location: &str) {
    let hx = resp
        .headers()
        .get("hx-redirect")
        .expect("Expected HX-Redirect header")
        .to_str()
        .unwrap();
    assert_eq!(hx, expected_location);
}
