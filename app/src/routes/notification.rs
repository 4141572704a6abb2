use axum::{
    Router,
    routing::{delete, post},
};

use infra::{
    AppState,
    http::handler::notification::{delete_all, flight_cancelled},
};

pub fn create_notification_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", delete(delete_all))
        .route("/flight-cancelled", post(flight_cancelled))
        .with_state(app_state)
}
