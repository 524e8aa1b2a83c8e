use askama::Template;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect},
    routing::{delete, get, post},
    Form, Router,
};
use serde::Deserialize;
use std::collections::HashMap;

use crate::auth::OwnerUser;
use crate::error::AppError;
use crate::models::{Account, SubscriptionStatus};
use crate::routes::{format_timestamp, Page};
use crate::AppState;

struct ClubView {
    id: String,
    club_name: String,
    username: String,
    email: String,
    status: &'static str,
    days_left: i64,
    created_at: String,
}

#[derive(Template)]
#[template(path = "owner/dashboard.html")]
struct OwnerDashboardTemplate {
    clubs: Vec<ClubView>,
    subscribed: usize,
    on_trial: usize,
    form: ClubAccountForm,
    errors: HashMap<String, String>,

    page: Page,
}

#[derive(Deserialize, Default)]
pub struct ClubAccountForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    club_name: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/owner", get(dashboard))
        .route("/owner/accounts", post(create_account))
        .route("/owner/accounts/{id}", delete(delete_account))
}

fn render_dashboard(
    state: &AppState,
    owner: Account,
    form: ClubAccountForm,
    errors: HashMap<String, String>,
) -> Result<Html<String>, AppError> {
    let summaries = state.stores.auth.account_summaries();

    let subscribed = summaries
        .iter()
        .filter(|s| matches!(s.status, SubscriptionStatus::Subscribed { .. }))
        .count();
    let on_trial = summaries
        .iter()
        .filter(|s| matches!(s.status, SubscriptionStatus::Trial { .. }))
        .count();

    let clubs = summaries
        .into_iter()
        .map(|s| ClubView {
            id: s.account.id,
            club_name: s.account.club_name,
            username: s.account.username,
            email: s.account.email,
            status: s.status.label(),
            days_left: s.days_left,
            created_at: format_timestamp(&s.account.created_at),
        })
        .collect();

    let template = OwnerDashboardTemplate {
        clubs,
        subscribed,
        on_trial,
        form,
        errors,

        page: Page::new(Some(owner)),
    };
    Ok(Html(template.render()?))
}

async fn dashboard(
    State(state): State<AppState>,
    OwnerUser(owner): OwnerUser,
) -> Result<impl IntoResponse, AppError> {
    render_dashboard(&state, owner, ClubAccountForm::default(), HashMap::new())
}

async fn create_account(
    State(state): State<AppState>,
    OwnerUser(owner): OwnerUser,
    Form(form): Form<ClubAccountForm>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = HashMap::new();
    let fields = [&form.email, &form.username, &form.password, &form.club_name];

    if fields.iter().any(|f| f.trim().is_empty()) {
        errors.insert("form".to_string(), "Please fill in all fields".to_string());
    } else if !state.stores.auth.create_club_account(
        &owner,
        form.email.trim(),
        form.username.trim(),
        &form.password,
        form.club_name.trim(),
    ) {
        errors.insert("form".to_string(), "Username already exists or invalid data".to_string());
    }

    if !errors.is_empty() {
        let form = ClubAccountForm {
            password: String::new(),
            ..form
        };
        return Ok(render_dashboard(&state, owner, form, errors)?.into_response());
    }

    Ok(Redirect::to("/owner").into_response())
}

async fn delete_account(
    State(state): State<AppState>,
    OwnerUser(owner): OwnerUser,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state.stores.auth.delete_club_account(&owner, &id);
    ([("HX-Redirect", "/owner")], "")
}
