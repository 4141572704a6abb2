use std::{thread::JoinHandle, time::Duration};

use once_cell::sync::Lazy;
use sqlx::PgPool;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use app::{create_app_state, get_subscriber, init_subscriber};
use domain::models::NewPassenger;
use infra::AppState;
use settings::AppSettings;

use crate::helpers::{TestApp, configure_test_app, spawn_app};

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Whether to output the application logs while testing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnableTracing {
    Yes,
    No,
}

static TRACING: Lazy<()> = Lazy::new(|| {
    let subscriber = get_subscriber(String::from("test"), log::Level::Debug, std::io::stdout);
    init_subscriber(subscriber).unwrap();
});

/// Test case for integration tests
///
/// ```
/// #[tokio::test]
/// async fn integration_test_case_skeleton() {
///     let app_settings = load_app_settings_for_testing(StorageBackend::Memory);
///     let test_case = TestCase::begin(app_settings, EnableTracing::No).await;
///
///     /************************************************************
///
///             Implement integration test logic here
///
///     *************************************************************/
///
///     test_case.end().await;
/// }
/// ```
pub struct TestCase {
    pub app_state: AppState,
    pub pg_pool: Option<PgPool>,
    app_handle: JoinHandle<()>,
    shutdown_signal: oneshot::Sender<()>,
    pub http_client: reqwest::Client,
}

impl TestCase {
    pub async fn begin(app_settings: AppSettings, enable_tracing: EnableTracing) -> Self {
        if enable_tracing == EnableTracing::Yes {
            Lazy::force(&TRACING);
        }
        let TestApp {
            app_settings,
            listener,
            repositories,
            pg_pool,
        } = configure_test_app(app_settings).await;
        let app_state =
            create_app_state(app_settings, repositories, CancellationToken::new()).unwrap();
        let (app_handle, shutdown_signal) = spawn_app(app_state.clone(), listener).await;
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap();
        Self {
            app_state,
            pg_pool,
            app_handle,
            shutdown_signal,
            http_client,
        }
    }

    pub async fn end(self) {
        self.app_state.shutdown.cancel();
        self.shutdown_signal.send(()).unwrap();
        self.app_handle.join().unwrap();
        if let Some(pool) = self.pg_pool {
            pool.close().await;
        }
    }

    pub fn origin(&self) -> String {
        format!(
            "{}://{}:{}",
            self.app_state.app_settings.http.protocol,
            self.app_state.app_settings.http.host,
            self.app_state.app_settings.http.port,
        )
    }

    pub async fn health_check(&self) -> reqwest::Response {
        let uri = format!("{}/health-check", self.origin());
        self.http_client.get(&uri).send().await.unwrap()
    }

    pub async fn passenger_list(&self) -> reqwest::Response {
        let uri = format!("{}/passengers", self.origin());
        self.http_client.get(&uri).send().await.unwrap()
    }

    pub async fn create_passenger(&self, body: &NewPassenger) -> reqwest::Response {
        let uri = format!("{}/passengers", self.origin());
        self.http_client.post(&uri).json(body).send().await.unwrap()
    }

    pub async fn passenger_by_id(&self, id: i64) -> reqwest::Response {
        let uri = format!("{}/passengers/{}", self.origin(), id);
        self.http_client.get(&uri).send().await.unwrap()
    }

    pub async fn delete_passenger(&self, id: i64) -> reqwest::Response {
        let uri = format!("{}/passengers/{}", self.origin(), id);
        self.http_client.delete(&uri).send().await.unwrap()
    }

    pub async fn passenger_notifications(&self, id: i64) -> reqwest::Response {
        let uri = format!("{}/passengers/{}/notifications", self.origin(), id);
        self.http_client.get(&uri).send().await.unwrap()
    }

    pub async fn flight_cancelled(&self, body: &serde_json::Value) -> reqwest::Response {
        let uri = format!("{}/notifications/flight-cancelled", self.origin());
        self.http_client.post(&uri).json(body).send().await.unwrap()
    }

    pub async fn delete_all_notifications(&self) -> reqwest::Response {
        let uri = format!("{}/notifications", self.origin());
        self.http_client.delete(&uri).send().await.unwrap()
    }
}

pub fn new_passenger(first_name: &str, last_name: &str, flight_id: i64) -> NewPassenger {
    NewPassenger {
        first_name: Some(first_name.to_string()),
        last_name: Some(last_name.to_string()),
        email: Some(format!("{}@x.com", first_name.to_lowercase())),
        flight_id: Some(flight_id),
    }
}
