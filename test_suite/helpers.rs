//! This module sets up and runs integration tests
//!
//! The integration tests run against the in-memory storage by default.
//! The tests for PostgreSQL are ignored, and run with `cargo test -- --ignored`
//! after starting the container in `compose.yaml`.
//!
//! The PostgreSQL tests use the same container as the development environment,
//! but create a separate test database for each test case.
//! The test database is named in the format `test_passenger_db_<uuid>`,
//! where `<uuid>` is the UUID with hyphens replaced by underscores.
//!
//! [NOTICE]
//!
//! A test database is created for each test case.
//! So you must run the `bin/drop_test_dbs.sh` script to drop all the test databases.
use std::{path::Path, thread::JoinHandle};

use sqlx::{Connection as _, Executor as _, PgConnection, PgPool};
use tokio::{net::TcpListener, sync::oneshot};

use app::{bind_address, load_app_settings, migrate, routes::create_router};
use infra::{
    AppState, DynRepositories, memory::memory_repositories,
    postgres::repositories::pg_repositories,
};
use settings::{AppSettings, DatabaseSettings, StorageBackend};

pub const TEST_DATABASE_PREFIX: &str = "test_passenger_db_";

/// Loads the application settings for the storage backend under test
pub fn load_app_settings_for_testing(backend: StorageBackend) -> AppSettings {
    let dir = std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set");
    let path = Path::new(&dir).join("..").join("app_settings.toml");
    let mut app_settings = load_app_settings(path.as_os_str().to_str().unwrap()).unwrap();
    app_settings.storage.backend = backend;
    app_settings
}

pub struct TestApp {
    pub app_settings: AppSettings,
    pub listener: TcpListener,
    pub repositories: DynRepositories,
    pub pg_pool: Option<PgPool>,
}

pub async fn configure_test_app(mut app_settings: AppSettings) -> TestApp {
    // Set up the storage
    let (repositories, pg_pool) = match app_settings.storage.backend {
        StorageBackend::Memory => (memory_repositories(), None),
        StorageBackend::Postgres => {
            let database_name =
                format!("{}{}", TEST_DATABASE_PREFIX, uuid::Uuid::new_v4()).replace('-', "_");
            app_settings.database.name = database_name; // テスト用のデータベース名を設定
            let pool = setup_database(&app_settings.database).await;
            (pg_repositories(pool.clone()), Some(pool))
        }
    };

    // Specify a random port for the HTTP server to bind
    app_settings.http.port = 0;
    let (listener, port) = bind_address(&app_settings.http).await.unwrap();
    app_settings.http.port = port;

    TestApp {
        app_settings,
        listener,
        repositories,
        pg_pool,
    }
}

/// Sets up the PostgreSQL database for testing
async fn setup_database(settings: &DatabaseSettings) -> PgPool {
    // Connect to the **postgres** database
    let postgres_settings = DatabaseSettings {
        name: String::from("postgres"),
        ..settings.clone()
    };
    let mut conn = PgConnection::connect_with(&postgres_settings.connect_options())
        .await
        .unwrap();

    // Create the test database
    conn.execute(format!("CREATE DATABASE {};", settings.name).as_str())
        .await
        .unwrap();

    // Migrate the database
    let pool = PgPool::connect_with(settings.connect_options())
        .await
        .unwrap();
    migrate(&pool).await.unwrap();

    pool
}

/// Spawns the application server in a separate thread
///
/// Returns a tuple containing the thread handle and a sender to signal for graceful shutdown.
pub async fn spawn_app(
    app_state: AppState,
    listener: TcpListener,
) -> (JoinHandle<()>, oneshot::Sender<()>) {
    let (close_tx, close_rx) = oneshot::channel();

    let handle = std::thread::spawn(|| run_server(app_state, listener, close_rx));
    (handle, close_tx)
}

/// Runs the application server with graceful shutdown support
fn run_server(app_state: AppState, listener: TcpListener, close_rx: oneshot::Receiver<()>) {
    let router = create_router(app_state);
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    rt.block_on(async move {
        // The listener was bound on the test runtime, so register it again on this runtime
        let listener = TcpListener::from_std(listener.into_std().unwrap()).unwrap();
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                _ = close_rx.await;
            })
            .await
            .unwrap();
    });
}

pub struct ResponseParts {
    /// ステータスコード
    pub status_code: reqwest::StatusCode,
    /// ボディ
    pub body: String,
}

pub async fn split_response(response: reqwest::Response) -> ResponseParts {
    ResponseParts {
        status_code: response.status(),
        body: response.text().await.unwrap(),
    }
}
