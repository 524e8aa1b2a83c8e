use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::models::{Bag, Member, Order};
use crate::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportData {
    exported_at: String,
    club_name: String,
    members: Vec<Member>,
    bags: Vec<Bag>,
    starred_bags: Vec<String>,
    orders: Vec<Order>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/export", get(export_data))
}

async fn export_data(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> impl IntoResponse {
    let owner = user.user_id();

    let export = ExportData {
        exported_at: state.clock.now().to_rfc3339(),
        club_name: user.club_name.clone(),
        members: state.stores.bags.members(&owner),
        bags: state.stores.bags.bags(&owner),
        starred_bags: state.stores.bags.starred_ids(&owner),
        orders: state.stores.orders.orders(&owner),
    };

    let filename = format!("bagroom-export-{}.json", state.clock.now().format("%Y-%m-%d"));
    let content_disposition = format!("attachment; filename=\"{}\"", filename);

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(value) = HeaderValue::from_str(&content_disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    (headers, Json(export))
}
