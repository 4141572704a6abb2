pub mod notification;
pub mod passenger;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use infra::{AppState, http::handler::health_check};

use crate::routes::{notification::create_notification_routes, passenger::create_passenger_routes};

/// ルーターを作成する。
///
/// # 引数
///
/// * `app_state`: アプリケーション状態
pub fn create_router(app_state: AppState) -> Router {
    axum::Router::new()
        .route("/health-check", get(health_check))
        .nest("/passengers", create_passenger_routes(app_state.clone()))
        .nest("/notifications", create_notification_routes(app_state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
