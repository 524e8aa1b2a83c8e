use askama::Template;
use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use std::collections::HashMap;
use tower_sessions::Session;

use crate::auth::{login_user, logout_user, SignedIn};
use crate::error::AppError;
use crate::models::{Account, SubscriptionPlan, SubscriptionStatus};
use crate::routes::{format_timestamp, Page};
use crate::AppState;

#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginTemplate {
    error: Option<String>,
    username: String,

    page: Page,
}

#[derive(Template)]
#[template(path = "auth/create_account.html")]
struct CreateAccountTemplate {
    form: CreateAccountForm,
    errors: HashMap<String, String>,

    page: Page,
}

struct PlanView {
    value: &'static str,
    name: &'static str,
    price: &'static str,
    period: &'static str,
}

#[derive(Template)]
#[template(path = "auth/subscription.html")]
struct SubscriptionTemplate {
    status: &'static str,
    expires: String,
    days_left: i64,
    plans: Vec<PlanView>,
    error: Option<String>,

    page: Page,
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize, Default)]
pub struct CreateAccountForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    confirm_password: String,
    #[serde(default)]
    club_name: String,
}

#[derive(Deserialize)]
pub struct PlanForm {
    #[serde(default)]
    plan: String,
}

/// `local@domain.tld` with no whitespace and a single `@`.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

fn validate_create_account_form(form: &CreateAccountForm) -> HashMap<String, String> {
    let mut errors = HashMap::new();

    let fields = [&form.email, &form.username, &form.password, &form.confirm_password, &form.club_name];
    if fields.iter().any(|f| f.trim().is_empty()) {
        errors.insert("form".to_string(), "Please fill in all fields".to_string());
        return errors;
    }

    if !is_valid_email(form.email.trim()) {
        errors.insert("email".to_string(), "Please enter a valid email address".to_string());
    }

    if form.username.trim().chars().count() < 3 {
        errors.insert("username".to_string(), "Username must be at least 3 characters long".to_string());
    }

    if form.password.chars().count() < 6 {
        errors.insert("password".to_string(), "Password must be at least 6 characters long".to_string());
    } else if form.password != form.confirm_password {
        errors.insert("confirm_password".to_string(), "Passwords do not match".to_string());
    }

    errors
}

fn landing_page(account: &Account) -> &'static str {
    if account.is_owner() { "/owner" } else { "/" }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login_submit))
        .route("/logout", post(logout))
        .route("/create-account", get(create_account_page).post(create_account_submit))
        .route("/subscription", get(subscription_page).post(subscription_submit))
}

async fn login_page() -> Result<impl IntoResponse, AppError> {
    let template = LoginTemplate {
        error: None,
        username: String::new(),

        page: Page::new(None),
    };
    Ok(Html(template.render()?))
}

async fn login_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<impl IntoResponse, AppError> {
    let error = if form.username.trim().is_empty() || form.password.is_empty() {
        "Please enter both username and password"
    } else {
        tokio::time::sleep(state.login_delay).await;
        match state.stores.auth.login(form.username.trim(), &form.password) {
            Some(account) => {
                login_user(&session, &account).await?;
                return Ok(Redirect::to(landing_page(&account)).into_response());
            }
            None => "Invalid username or password",
        }
    };

    let template = LoginTemplate {
        error: Some(error.to_string()),
        username: form.username,

        page: Page::new(None),
    };
    Ok(Html(template.render()?).into_response())
}

async fn logout(session: Session) -> Result<impl IntoResponse, AppError> {
    logout_user(&session).await?;
    Ok(Redirect::to("/login"))
}

async fn create_account_page() -> Result<impl IntoResponse, AppError> {
    let template = CreateAccountTemplate {
        form: CreateAccountForm::default(),
        errors: HashMap::new(),

        page: Page::new(None),
    };
    Ok(Html(template.render()?))
}

async fn create_account_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CreateAccountForm>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = validate_create_account_form(&form);

    if errors.is_empty() {
        tokio::time::sleep(state.login_delay).await;
        let created = state.stores.auth.register(
            form.email.trim(),
            form.username.trim(),
            &form.password,
            form.club_name.trim(),
        );
        match created {
            Some(account) => {
                login_user(&session, &account).await?;
                return Ok(Redirect::to("/").into_response());
            }
            None => {
                errors.insert("username".to_string(), "Username already exists".to_string());
            }
        }
    }

    let template = CreateAccountTemplate {
        form: CreateAccountForm {
            password: String::new(),
            confirm_password: String::new(),
            ..form
        },
        errors,

        page: Page::new(None),
    };
    Ok(Html(template.render()?).into_response())
}

fn plan_views() -> Vec<PlanView> {
    vec![
        PlanView {
            value: "monthly",
            name: "Monthly",
            price: SubscriptionPlan::Monthly.price(),
            period: "per month",
        },
        PlanView {
            value: "yearly",
            name: "Yearly",
            price: SubscriptionPlan::Yearly.price(),
            period: "per year",
        },
    ]
}

fn render_subscription(
    state: &AppState,
    account: Account,
    error: Option<String>,
) -> Result<axum::response::Response, AppError> {
    let now = state.clock.now();
    let status = state.stores.auth.subscription_status(&account);
    let expires = match status {
        SubscriptionStatus::Subscribed { expires_at } | SubscriptionStatus::Trial { expires_at } => {
            format_timestamp(&expires_at)
        }
        _ => String::new(),
    };

    let template = SubscriptionTemplate {
        status: status.label(),
        expires,
        days_left: status.days_left(now),
        plans: plan_views(),
        error,

        page: Page::new(Some(account)),
    };
    Ok(Html(template.render()?).into_response())
}

async fn subscription_page(
    State(state): State<AppState>,
    SignedIn(account): SignedIn,
) -> Result<impl IntoResponse, AppError> {
    if account.is_owner() {
        return Ok(Redirect::to("/owner").into_response());
    }
    render_subscription(&state, account, None)
}

async fn subscription_submit(
    State(state): State<AppState>,
    SignedIn(account): SignedIn,
    Form(form): Form<PlanForm>,
) -> Result<impl IntoResponse, AppError> {
    if account.is_owner() {
        return Ok(Redirect::to("/owner").into_response());
    }

    let plan = match form.plan.as_str() {
        "monthly" => SubscriptionPlan::Monthly,
        "yearly" => SubscriptionPlan::Yearly,
        _ => {
            return render_subscription(&state, account, Some("Please select a subscription plan".to_string()));
        }
    };

    tokio::time::sleep(state.login_delay).await;
    if state.stores.auth.set_subscription(&account, plan).is_none() {
        return render_subscription(&state, account, Some("Payment failed. Please try again.".to_string()));
    }

    Ok(Redirect::to("/").into_response())
}
