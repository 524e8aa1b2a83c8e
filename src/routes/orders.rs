use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
    Form, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::{Bag, Member, NewOrder, Order, OrderPriority, OrderStatus, OrderType};
use crate::routes::{format_date, format_timestamp, non_empty, Page};
use crate::AppState;

pub struct OrderView {
    pub id: String,
    pub bag_id: String,
    pub bag_number: String,
    pub member_name: String,
    pub order_type: &'static str,
    pub type_description: &'static str,
    pub status: &'static str,
    pub status_label: &'static str,
    pub priority: &'static str,
    pub description: String,
    pub requested_by: String,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: String,
    pub notes: String,
    pub target_location: String,
    pub estimated_cost: String,
    pub due_date: String,
}

pub(crate) fn order_view(order: &Order, bags: &[Bag], members: &[Member]) -> OrderView {
    let bag = bags.iter().find(|b| b.id == order.bag_id);
    let member = members.iter().find(|m| m.id == order.member_id);
    OrderView {
        id: order.id.clone(),
        bag_id: order.bag_id.clone(),
        bag_number: bag.map(|b| b.bag_number.clone()).unwrap_or_else(|| "?".to_string()),
        member_name: member.map(|m| m.name.clone()).unwrap_or_else(|| "Unknown member".to_string()),
        order_type: order.order_type.as_str(),
        type_description: order.order_type.description(),
        status: order.status.as_str(),
        status_label: order.status.label(),
        priority: order.priority.as_str(),
        description: order.description.clone(),
        requested_by: order.requested_by.clone(),
        created_at: format_timestamp(&order.created_at),
        updated_at: format_timestamp(&order.updated_at),
        completed_at: order.completed_at.as_ref().map(format_timestamp).unwrap_or_default(),
        notes: order.notes.clone().unwrap_or_default(),
        target_location: order.target_location.clone().unwrap_or_default(),
        estimated_cost: order.estimated_cost.map(|c| format!("${:.2}", c)).unwrap_or_default(),
        due_date: order.due_date.as_ref().map(format_date).unwrap_or_default(),
    }
}

pub struct StatusTab {
    pub value: &'static str,
    pub label: &'static str,
    pub count: usize,
    pub active: bool,
}

pub struct Choice {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

pub struct BagChoice {
    pub id: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "orders/list.html")]
struct OrderListTemplate {
    orders: Vec<OrderView>,
    tabs: Vec<StatusTab>,

    page: Page,
}

#[derive(Template)]
#[template(path = "orders/form.html")]
struct OrderFormTemplate {
    form: OrderForm,
    bags: Vec<BagChoice>,
    types: Vec<Choice>,
    priorities: Vec<Choice>,
    errors: HashMap<String, String>,

    page: Page,
}

#[derive(Template)]
#[template(path = "orders/show.html")]
struct OrderShowTemplate {
    order: OrderView,
    statuses: Vec<Choice>,

    page: Page,
}

#[derive(Deserialize)]
pub struct OrderListQuery {
    status: Option<String>,
}

#[derive(Deserialize)]
pub struct NewOrderQuery {
    bag_id: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct OrderForm {
    #[serde(default)]
    bag_id: String,
    #[serde(default)]
    order_type: String,
    #[serde(default)]
    priority: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    requested_by: String,
    #[serde(default)]
    notes: String,
    #[serde(default)]
    target_location: String,
    #[serde(default)]
    estimated_cost: String,
    #[serde(default)]
    due_date: String,
}

#[derive(Deserialize)]
pub struct StatusForm {
    status: String,
}

#[derive(Deserialize)]
pub struct NotesForm {
    #[serde(default)]
    notes: String,
}

fn validate_order_form(form: &OrderForm, bag_exists: bool) -> HashMap<String, String> {
    let mut errors = HashMap::new();

    if form.bag_id.is_empty() || form.description.trim().is_empty() || form.requested_by.trim().is_empty() {
        errors.insert("form".to_string(), "Please fill in all required fields".to_string());
    } else if !bag_exists {
        errors.insert("bag_id".to_string(), "Selected bag not found".to_string());
    }

    if !form.order_type.is_empty() && OrderType::parse(&form.order_type).is_none() {
        errors.insert("order_type".to_string(), "Unknown order type".to_string());
    }

    if !form.priority.is_empty() && OrderPriority::parse(&form.priority).is_none() {
        errors.insert("priority".to_string(), "Unknown priority".to_string());
    }

    let cost = form.estimated_cost.trim();
    if !cost.is_empty() && !cost.parse::<f64>().is_ok_and(|c| c.is_finite() && c >= 0.0) {
        errors.insert("estimated_cost".to_string(), "Estimated cost must be a number".to_string());
    }

    let due = form.due_date.trim();
    if !due.is_empty() && NaiveDate::parse_from_str(due, "%Y-%m-%d").is_err() {
        errors.insert("due_date".to_string(), "Due date must be YYYY-MM-DD".to_string());
    }

    errors
}

fn type_choices(selected: Option<OrderType>) -> Vec<Choice> {
    OrderType::ALL
        .into_iter()
        .map(|t| Choice {
            value: t.as_str(),
            label: t.description(),
            selected: Some(t) == selected,
        })
        .collect()
}

fn priority_choices(selected: Option<OrderPriority>) -> Vec<Choice> {
    OrderPriority::ALL
        .into_iter()
        .map(|p| Choice {
            value: p.as_str(),
            label: p.as_str(),
            selected: Some(p) == selected,
        })
        .collect()
}

fn bag_choices(bags: &[Bag], members: &[Member], selected: &str) -> Vec<BagChoice> {
    bags.iter()
        .map(|bag| {
            let name = members
                .iter()
                .find(|m| m.id == bag.member_id)
                .map(|m| m.name.as_str())
                .unwrap_or("Unknown member");
            BagChoice {
                id: bag.id.clone(),
                label: format!("#{} {}", bag.bag_number, name),
                selected: bag.id == selected,
            }
        })
        .collect()
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/new", get(new_order_form))
        .route("/orders/{id}", get(show_order).delete(delete_order))
        .route("/orders/{id}/status", post(update_status))
        .route("/orders/{id}/notes", post(update_notes))
}

async fn list_orders(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<OrderListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let owner = user.user_id();
    let selected = query.status.as_deref().and_then(OrderStatus::parse);

    let orders = state.stores.orders.list_orders(&owner, selected);
    let counts = state.stores.orders.get_status_counts(&owner);
    let bags = state.stores.bags.bags(&owner);
    let members = state.stores.bags.members(&owner);

    let mut tabs = vec![StatusTab {
        value: "",
        label: "All",
        count: counts.total(),
        active: selected.is_none(),
    }];
    tabs.extend(OrderStatus::ALL.into_iter().map(|s| StatusTab {
        value: s.as_str(),
        label: s.label(),
        count: counts.get(s),
        active: Some(s) == selected,
    }));

    let template = OrderListTemplate {
        orders: orders.iter().map(|o| order_view(o, &bags, &members)).collect(),
        tabs,

        page: Page::new(Some(user)),
    };
    Ok(Html(template.render()?))
}

async fn new_order_form(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<NewOrderQuery>,
) -> Result<impl IntoResponse, AppError> {
    let owner = user.user_id();
    let bags = state.stores.bags.bags(&owner);
    let members = state.stores.bags.members(&owner);

    let form = OrderForm {
        bag_id: query.bag_id.unwrap_or_default(),
        ..OrderForm::default()
    };

    let template = OrderFormTemplate {
        bags: bag_choices(&bags, &members, &form.bag_id),
        types: type_choices(Some(OrderType::Regroup)),
        priorities: priority_choices(Some(OrderPriority::Medium)),
        form,
        errors: HashMap::new(),

        page: Page::new(Some(user)),
    };
    Ok(Html(template.render()?))
}

async fn create_order(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Form(form): Form<OrderForm>,
) -> Result<impl IntoResponse, AppError> {
    let owner = user.user_id();
    let bag = state.stores.bags.get_bag_by_id(&owner, &form.bag_id);

    let errors = validate_order_form(&form, bag.is_some());
    let Some(bag) = bag.filter(|_| errors.is_empty()) else {
        let bags = state.stores.bags.bags(&owner);
        let members = state.stores.bags.members(&owner);
        let template = OrderFormTemplate {
            bags: bag_choices(&bags, &members, &form.bag_id),
            types: type_choices(OrderType::parse(&form.order_type)),
            priorities: priority_choices(OrderPriority::parse(&form.priority)),
            form,
            errors,
            page: Page::new(Some(user)),
        };
        return Ok(Html(template.render()?).into_response());
    };

    let order_type = OrderType::parse(&form.order_type).unwrap_or(OrderType::Regroup);
    let mut new = NewOrder::new(
        bag.id.clone(),
        bag.member_id.clone(),
        order_type,
        form.description.trim().to_string(),
        form.requested_by.trim().to_string(),
    );
    new.priority = OrderPriority::parse(&form.priority).unwrap_or_default();
    new.notes = non_empty(Some(form.notes));
    new.target_location = non_empty(Some(form.target_location)).filter(|_| order_type.has_target_location());
    new.estimated_cost = form.estimated_cost.trim().parse().ok();
    new.due_date = NaiveDate::parse_from_str(form.due_date.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc());

    let order = state.stores.orders.create_order(&owner, new);
    tracing::debug!(order = %order.id, bag = %order.bag_id, "order form accepted");

    Ok(Redirect::to("/orders").into_response())
}

async fn show_order(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let owner = user.user_id();
    let Some(order) = state.stores.orders.get_order_by_id(&owner, &id) else {
        return Err(AppError::NotFound);
    };

    let bags = state.stores.bags.bags(&owner);
    let members = state.stores.bags.members(&owner);
    let statuses = OrderStatus::ALL
        .into_iter()
        .map(|s| Choice {
            value: s.as_str(),
            label: s.label(),
            selected: s == order.status,
        })
        .collect();

    let template = OrderShowTemplate {
        order: order_view(&order, &bags, &members),
        statuses,

        page: Page::new(Some(user)),
    };
    Ok(Html(template.render()?))
}

async fn update_status(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Result<impl IntoResponse, AppError> {
    let owner = user.user_id();
    if state.stores.orders.get_order_by_id(&owner, &id).is_none() {
        return Err(AppError::NotFound);
    }

    if let Some(status) = OrderStatus::parse(&form.status) {
        state.stores.orders.update_order_status(&owner, &id, status);
    }

    Ok(Redirect::to(&format!("/orders/{}", id)))
}

async fn update_notes(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Form(form): Form<NotesForm>,
) -> Result<impl IntoResponse, AppError> {
    if !state.stores.orders.update_order_notes(&user.user_id(), &id, form.notes) {
        return Err(AppError::NotFound);
    }
    Ok(Redirect::to(&format!("/orders/{}", id)))
}

async fn delete_order(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state.stores.orders.delete_order(&user.user_id(), &id);
    ([("HX-Redirect", "/orders")], "")
}
