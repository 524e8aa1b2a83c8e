use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use std::collections::HashMap;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::{Bag, BagLocation, Member};
use crate::routes::orders::{order_view, OrderView};
use crate::routes::{format_timestamp, non_empty, Page};
use crate::store::BagFilter;
use crate::AppState;

pub struct BagView {
    pub id: String,
    pub bag_number: String,
    pub member_id: String,
    pub member_name: String,
    pub membership_id: String,
    pub location: &'static str,
    pub location_label: &'static str,
    pub last_updated: String,
    pub notes: String,
    pub starred: bool,
}

pub(crate) fn bag_view(bag: &Bag, members: &[Member], starred: &[String]) -> BagView {
    let member = members.iter().find(|m| m.id == bag.member_id);
    BagView {
        id: bag.id.clone(),
        bag_number: bag.bag_number.clone(),
        member_id: bag.member_id.clone(),
        member_name: member.map(|m| m.name.clone()).unwrap_or_else(|| "Unknown member".to_string()),
        membership_id: member.map(|m| m.membership_id.clone()).unwrap_or_default(),
        location: bag.location.as_str(),
        location_label: bag.location.label(),
        last_updated: format_timestamp(&bag.last_updated),
        notes: bag.notes.clone().unwrap_or_default(),
        starred: starred.contains(&bag.id),
    }
}

pub struct LocationOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

fn location_options(selected: Option<BagLocation>) -> Vec<LocationOption> {
    BagLocation::ALL
        .into_iter()
        .map(|l| LocationOption {
            value: l.as_str(),
            label: l.label(),
            selected: Some(l) == selected,
        })
        .collect()
}

#[derive(Template)]
#[template(path = "bags/list.html")]
struct BagListTemplate {
    bags: Vec<BagView>,
    locations: Vec<LocationOption>,
    starred_only: bool,
    query: String,
    total: usize,

    page: Page,
}

#[derive(Template)]
#[template(path = "bags/form.html")]
struct BagFormTemplate {
    form: BagForm,
    locations: Vec<LocationOption>,
    errors: HashMap<String, String>,

    page: Page,
}

#[derive(Template)]
#[template(path = "bags/show.html")]
struct BagShowTemplate {
    bag: BagView,
    locations: Vec<LocationOption>,
    orders: Vec<OrderView>,

    page: Page,
}

#[derive(Deserialize)]
pub struct BagListQuery {
    location: Option<String>,
    starred: Option<String>,
    q: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct BagForm {
    #[serde(default)]
    member_name: String,
    #[serde(default)]
    membership_id: String,
    #[serde(default)]
    bag_number: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    notes: String,
}

#[derive(Deserialize)]
pub struct LocationForm {
    location: String,
}

#[derive(Deserialize)]
pub struct NotesForm {
    #[serde(default)]
    notes: String,
}

fn validate_bag_form(form: &BagForm) -> HashMap<String, String> {
    let mut errors = HashMap::new();

    if form.member_name.trim().is_empty() || form.bag_number.trim().is_empty() {
        errors.insert("form".to_string(), "Please fill in all required fields".to_string());
    }

    if !form.location.is_empty() && BagLocation::parse(&form.location).is_none() {
        errors.insert("location".to_string(), "Unknown location".to_string());
    }

    errors
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/bags", get(list_bags).post(create_bag))
        .route("/bags/new", get(new_bag_form))
        .route("/bags/{id}", get(show_bag).delete(delete_bag))
        .route("/bags/{id}/location", post(update_location))
        .route("/bags/{id}/notes", post(update_notes))
        .route("/bags/{id}/star", post(toggle_star))
}

async fn list_bags(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<BagListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let owner = user.user_id();
    let filter = BagFilter {
        location: query.location.as_deref().and_then(BagLocation::parse),
        starred_only: query.starred.as_deref().is_some_and(|s| s == "1" || s == "true"),
        query: query.q.unwrap_or_default(),
    };

    let bags = state.stores.bags.list_bags(&owner, &filter);
    let members = state.stores.bags.members(&owner);
    let starred = state.stores.bags.starred_ids(&owner);

    let template = BagListTemplate {
        bags: bags.iter().map(|b| bag_view(b, &members, &starred)).collect(),
        locations: location_options(filter.location),
        starred_only: filter.starred_only,
        query: filter.query,
        total: state.stores.bags.get_location_counts(&owner).total(),

        page: Page::new(Some(user)),
    };
    Ok(Html(template.render()?))
}

async fn new_bag_form(AuthUser(user): AuthUser) -> Result<impl IntoResponse, AppError> {
    let template = BagFormTemplate {
        form: BagForm::default(),
        locations: location_options(Some(BagLocation::Bagroom)),
        errors: HashMap::new(),

        page: Page::new(Some(user)),
    };
    Ok(Html(template.render()?))
}

async fn create_bag(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Form(form): Form<BagForm>,
) -> Result<impl IntoResponse, AppError> {
    let errors = validate_bag_form(&form);
    if !errors.is_empty() {
        let template = BagFormTemplate {
            locations: location_options(BagLocation::parse(&form.location)),
            form,
            errors,
            page: Page::new(Some(user)),
        };
        return Ok(Html(template.render()?).into_response());
    }

    let owner = user.user_id();
    let location = BagLocation::parse(&form.location).unwrap_or(BagLocation::Bagroom);

    let member = Member::new(form.member_name.trim().to_string(), form.membership_id.trim().to_string());
    let mut bag = Bag::new(
        member.id.clone(),
        form.bag_number.trim().to_string(),
        location,
        state.clock.now(),
    );
    bag.notes = non_empty(Some(form.notes));

    state.stores.bags.add_member(&owner, member);
    state.stores.bags.add_bag(&owner, bag);

    Ok(Redirect::to("/bags").into_response())
}

async fn show_bag(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let owner = user.user_id();
    let Some(bag) = state.stores.bags.get_bag_by_id(&owner, &id) else {
        return Err(AppError::NotFound);
    };

    let members = state.stores.bags.members(&owner);
    let starred = state.stores.bags.starred_ids(&owner);
    let bags = [bag.clone()];
    let orders = state
        .stores
        .orders
        .get_orders_for_bag(&owner, &id)
        .iter()
        .map(|o| order_view(o, &bags, &members))
        .collect();

    let template = BagShowTemplate {
        locations: location_options(Some(bag.location)),
        bag: bag_view(&bag, &members, &starred),
        orders,

        page: Page::new(Some(user)),
    };
    Ok(Html(template.render()?))
}

async fn update_location(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Form(form): Form<LocationForm>,
) -> Result<impl IntoResponse, AppError> {
    let owner = user.user_id();
    if state.stores.bags.get_bag_by_id(&owner, &id).is_none() {
        return Err(AppError::NotFound);
    }

    if let Some(location) = BagLocation::parse(&form.location) {
        state.stores.bags.update_bag_location(&owner, &id, location);
    }

    Ok(Redirect::to(&format!("/bags/{}", id)))
}

async fn update_notes(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Form(form): Form<NotesForm>,
) -> Result<impl IntoResponse, AppError> {
    if !state.stores.bags.update_bag_notes(&user.user_id(), &id, form.notes) {
        return Err(AppError::NotFound);
    }
    Ok(Redirect::to(&format!("/bags/{}", id)))
}

async fn toggle_star(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let owner = user.user_id();
    if state.stores.bags.get_bag_by_id(&owner, &id).is_none() {
        return Err(AppError::NotFound);
    }
    state.stores.bags.toggle_star_bag(&owner, &id);
    Ok(Redirect::to(&format!("/bags/{}", id)))
}

async fn delete_bag(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state.stores.bags.delete_bag(&user.user_id(), &id);

    // htmx follows HX-Redirect after the delete
    ([("HX-Redirect", "/bags")], "")
}
