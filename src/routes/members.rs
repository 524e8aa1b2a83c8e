use askama::Template;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse},
    routing::get,
    Router,
};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::Member;
use crate::routes::bags::{bag_view, BagView};
use crate::routes::Page;
use crate::AppState;

#[derive(Template)]
#[template(path = "members/show.html")]
struct MemberShowTemplate {
    member: Member,
    bags: Vec<BagView>,

    page: Page,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/members/{id}", get(show_member))
}

async fn show_member(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let owner = user.user_id();
    let Some(member) = state.stores.bags.get_member_by_id(&owner, &id) else {
        return Err(AppError::NotFound);
    };

    let members = [member.clone()];
    let starred = state.stores.bags.starred_ids(&owner);
    let bags = state
        .stores
        .bags
        .get_bags_for_member(&owner, &id)
        .iter()
        .map(|b| bag_view(b, &members, &starred))
        .collect();

    let template = MemberShowTemplate {
        member,
        bags,

        page: Page::new(Some(user)),
    };
    Ok(Html(template.render()?))
}
