use axum::Router;

pub mod shares;
pub mod trust;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .nest("/trust", trust::router(state.clone()))
        .nest("/shares", shares::router(state.clone()))
        .with_state(state)
}
