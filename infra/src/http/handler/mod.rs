pub mod notification;
pub mod passenger;

use std::sync::Arc;

use domain::repositories::{NotificationRepository, PassengerRepository};
use use_case::{notification::NotificationUseCase, passenger::PassengerUseCase};

use crate::AppState;

/// ヘルスチェックハンドラ
#[tracing::instrument()]
pub async fn health_check() -> &'static str {
    "Ok, the server is running!"
}

type PassengerUseCaseImpl = PassengerUseCase<Arc<dyn PassengerRepository>>;

fn passenger_use_case(app_state: &AppState) -> PassengerUseCaseImpl {
    PassengerUseCase::new(app_state.repositories.passenger_repository.clone())
}

type NotificationUseCaseImpl =
    NotificationUseCase<Arc<dyn PassengerRepository>, Arc<dyn NotificationRepository>>;

fn notification_use_case(app_state: &AppState) -> NotificationUseCaseImpl {
    NotificationUseCase::new(
        app_state.repositories.passenger_repository.clone(),
        app_state.repositories.notification_repository.clone(),
    )
}
