use axum::{Router, routing::get};

use infra::{
    AppState,
    http::handler::passenger::{by_id, create, delete, list, notifications},
};

pub fn create_passenger_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(by_id).delete(delete))
        .route("/{id}/notifications", get(notifications))
        .with_state(app_state)
}
