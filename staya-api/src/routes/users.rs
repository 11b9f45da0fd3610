use axum::{extract::State, routing::get, Router};

use staya_core::PublicProfile;

use crate::error::AppError;
use crate::extract::{IdPath, PageQuery, QueryParams};
use crate::middleware::ADMIN_ONLY;
use crate::response::Envelope;
use crate::routes::restricted;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", restricted(get(list_users), &state, ADMIN_ONLY))
        .route("/{id}", restricted(get(get_user), &state, ADMIN_ONLY))
}

async fn list_users(
    State(state): State<AppState>,
    QueryParams(page): QueryParams<PageQuery>,
) -> Result<Envelope<Vec<PublicProfile>>, AppError> {
    let page = page.request();
    let (users, total) = state.users.list_users(page).await?;
    let profiles: Vec<PublicProfile> = users.iter().map(PublicProfile::from).collect();
    Ok(Envelope::page(profiles, page.info(total)))
}

async fn get_user(State(state): State<AppState>, IdPath(id): IdPath) -> Result<Envelope<PublicProfile>, AppError> {
    let user = state
        .users
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Envelope::ok(user.profile()))
}
