/// Runs a test scenario against the in-memory storage, and against PostgreSQL when ignored tests are requested
macro_rules! storage_tests {
    ($($scenario:ident),* $(,)?) => {
        $(
            mod $scenario {
                #[tokio::test]
                async fn memory() {
                    super::$scenario(settings::StorageBackend::Memory).await;
                }

                #[tokio::test]
                #[ignore]
                async fn postgres() {
                    super::$scenario(settings::StorageBackend::Postgres).await;
                }
            }
        )*
    };
}
pub(crate) use storage_tests;

mod helpers;
mod notification;
mod passenger;
mod test_case;

use settings::StorageBackend;

use crate::{
    helpers::load_app_settings_for_testing,
    test_case::{EnableTracing, TestCase},
};

#[tokio::test]
async fn health_check() {
    let app_settings = load_app_settings_for_testing(StorageBackend::Memory);
    let test_case = TestCase::begin(app_settings, EnableTracing::No).await;

    let response = test_case.health_check().await;
    assert!(
        response.status().is_success(),
        "Health check failed: {}",
        response.status()
    );
    assert!(
        response
            .text()
            .await
            .unwrap()
            .contains("Ok, the server is running!"),
        "Health check response did not contain 'Ok, the server is running!'"
    );

    test_case.end().await;
}
