//! Registry sync service: validate, write through the pooled store, then
//! push the refreshed listing to subscribers.

use std::sync::Arc;

use anyhow::anyhow;
use tracing::{debug, warn};

use parlor_db::Database;
use parlor_db::models::UserRow;
use parlor_types::api::NewUser;
use parlor_types::events::GatewayEvent;
use parlor_types::models::User;

use crate::dispatcher::Dispatcher;
use crate::error::RegistryError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub dispatcher: Dispatcher,
}

/// Insert a registry entry and broadcast the refreshed listing.
///
/// The push always follows the completed insert; a push failure is logged
/// and does not undo the insert.
pub async fn add_user(state: &AppState, user: NewUser) -> Result<User, RegistryError> {
    let name = user.name.trim().to_string();
    let email = user.email.trim().to_string();
    if name.is_empty() || email.is_empty() {
        return Err(RegistryError::Validation("nome and email are required"));
    }
    let age = user.age;

    let db = state.clone();
    let (insert_name, insert_email) = (name.clone(), email.clone());
    let id = tokio::task::spawn_blocking(move || db.db.insert_user(&insert_name, &insert_email, age))
        .await
        .map_err(|e| anyhow!("blocking task failed: {e}"))??;
    debug!(id, "user inserted");

    if let Err(err) = push_user_list(state).await {
        warn!("user list refresh failed after insert: {err}");
    }

    Ok(User {
        id,
        name,
        email,
        age,
    })
}

/// Fetch all registry rows in storage-native order.
pub async fn list_users(state: &AppState) -> Result<Vec<User>, RegistryError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_users())
        .await
        .map_err(|e| anyhow!("blocking task failed: {e}"))??;
    Ok(rows.into_iter().map(to_api).collect())
}

/// Fetch the current listing and broadcast it to every connected client.
pub async fn push_user_list(state: &AppState) -> Result<(), RegistryError> {
    let rows = list_users(state).await?;
    state.dispatcher.broadcast(GatewayEvent::UserList { rows });
    Ok(())
}

fn to_api(row: UserRow) -> User {
    User {
        id: row.id,
        name: row.name,
        email: row.email,
        age: row.age,
    }
}
