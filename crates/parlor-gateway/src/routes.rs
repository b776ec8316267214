//! REST surface over the same registry service the gateway uses.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use parlor_types::api::NewUser;
use parlor_types::models::User;

use crate::error::RegistryError;
use crate::registry::{self, AppState};

/// `POST /users` — insert a registry entry. Subscribed gateway clients see
/// the refreshed listing as a `user-list` broadcast.
pub async fn create_user(
    State(state): State<AppState>,
    Json(user): Json<NewUser>,
) -> Result<impl IntoResponse, RegistryError> {
    let created = registry::add_user(&state, user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /users` — all registry rows in storage-native order.
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, RegistryError> {
    Ok(Json(registry::list_users(&state).await?))
}
