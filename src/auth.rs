use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::AppState;
use crate::models::Account;

const ACCOUNT_ID_KEY: &str = "account_id";

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut rand::rngs::OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

async fn session_account(parts: &mut Parts, state: &AppState) -> Result<Account, AuthRedirect> {
    let session = Session::from_request_parts(parts, state)
        .await
        .map_err(|_| AuthRedirect::Login)?;

    let account_id: Option<String> = session.get(ACCOUNT_ID_KEY).await.ok().flatten();

    account_id
        .and_then(|id| state.stores.auth.find_account(&id))
        .ok_or(AuthRedirect::Login)
}

/// A signed-in account with a running trial or subscription.
pub struct AuthUser(pub Account);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let account = session_account(parts, state).await?;
        if !state.stores.auth.is_subscription_active(&account) {
            return Err(AuthRedirect::Subscription);
        }
        Ok(AuthUser(account))
    }
}

/// A signed-in account, whether or not its subscription has lapsed.
pub struct SignedIn(pub Account);

impl FromRequestParts<AppState> for SignedIn {
    type Rejection = AuthRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        session_account(parts, state).await.map(SignedIn)
    }
}

/// The platform owner.
pub struct OwnerUser(pub Account);

impl FromRequestParts<AppState> for OwnerUser {
    type Rejection = AuthRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let account = session_account(parts, state).await?;
        if !account.is_owner() {
            return Err(AuthRedirect::Login);
        }
        Ok(OwnerUser(account))
    }
}

pub enum AuthRedirect {
    Login,
    Subscription,
}

impl IntoResponse for AuthRedirect {
    fn into_response(self) -> Response {
        match self {
            AuthRedirect::Login => Redirect::to("/login").into_response(),
            AuthRedirect::Subscription => Redirect::to("/subscription").into_response(),
        }
    }
}

pub async fn login_user(session: &Session, account: &Account) -> Result<(), tower_sessions::session::Error> {
    session.insert(ACCOUNT_ID_KEY, &account.id).await
}

pub async fn logout_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
