pub mod dto;
pub mod handlers;
pub mod memory;
pub mod object_id;
pub mod repo;
pub mod repo_types;
pub mod store;
pub mod validation;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
