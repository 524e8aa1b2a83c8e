use askama::Template;
use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::BagLocation;
use crate::routes::bags::{bag_view, BagView};
use crate::routes::orders::{order_view, OrderView};
use crate::routes::Page;
use crate::AppState;

const RECENT_ORDERS: usize = 5;

struct LocationCard {
    value: &'static str,
    label: &'static str,
    count: usize,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    cards: Vec<LocationCard>,
    starred: Vec<BagView>,
    open_orders: Vec<OrderView>,

    page: Page,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(dashboard))
}

async fn dashboard(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let owner = user.user_id();
    let counts = state.stores.bags.get_location_counts(&owner);
    let bags = state.stores.bags.bags(&owner);
    let members = state.stores.bags.members(&owner);
    let starred_ids = state.stores.bags.starred_ids(&owner);

    let cards = BagLocation::ALL
        .into_iter()
        .map(|l| LocationCard {
            value: l.as_str(),
            label: l.label(),
            count: counts.get(l),
        })
        .collect();

    let starred = state
        .stores
        .bags
        .get_starred_bags(&owner)
        .iter()
        .map(|b| bag_view(b, &members, &starred_ids))
        .collect();

    let open_orders = state
        .stores
        .orders
        .list_orders(&owner, None)
        .iter()
        .filter(|o| o.status.is_open())
        .take(RECENT_ORDERS)
        .map(|o| order_view(o, &bags, &members))
        .collect();

    let template = DashboardTemplate {
        cards,
        starred,
        open_orders,

        page: Page::new(Some(user)),
    };
    Ok(Html(template.render()?))
}
