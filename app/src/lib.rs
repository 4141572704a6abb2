pub mod routes;

use std::time::Duration;

use anyhow::Context as _;
use config::Config;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{Subscriber, subscriber::set_global_default};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, Registry, fmt::MakeWriter, layer::SubscriberExt as _};

use domain::models::MessageTemplate;
use infra::{
    AppState, DynRepositories, memory::memory_repositories, postgres::repositories::pg_repositories,
};
use settings::{AppSettings, DatabaseSettings, HttpSettings, StorageBackend};

/// 環境変数で設定を上書きするときの接頭辞
///
/// `PASSENGER__HTTP__PORT=9000`のように指定する。
const ENV_PREFIX: &str = "PASSENGER";

/// アプリケーション設定を読み込む。
///
/// 設定ファイルの値は、環境変数で上書きできる。
pub fn load_app_settings(path: &str) -> anyhow::Result<AppSettings> {
    let config = Config::builder()
        .add_source(config::File::with_name(path))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()
        .context("Failed to read the app_settings.toml file")?;
    config
        .try_deserialize()
        .context("The contents of the app_settings.toml file is incorrect")
}

pub async fn bind_address(settings: &HttpSettings) -> anyhow::Result<(TcpListener, u16)> {
    let listener = TcpListener::bind(settings.bind_address())
        .await
        .context("Failed to bind to the address for the HTTP server")?;
    let port = listener
        .local_addr()
        .context("Failed to get the port of listener")?
        .port();

    Ok((listener, port))
}

pub async fn create_pg_pool(
    settings: &DatabaseSettings,
) -> anyhow::Result<sqlx::Pool<sqlx::Postgres>> {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.connection_timeout))
        .connect_with(settings.connect_options())
        .await
        .context("Failed to connect to the database")
}

/// データベースをマイグレーションする。
pub async fn migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("../migrations")
        .run(pool)
        .await
        .context("Failed to migrate the database")
}

/// 設定されたストレージのリポジトリコレクションを作成する。
pub async fn create_repositories(app_settings: &AppSettings) -> anyhow::Result<DynRepositories> {
    match app_settings.storage.backend {
        StorageBackend::Postgres => {
            let pool = create_pg_pool(&app_settings.database).await?;
            migrate(&pool).await?;
            Ok(pg_repositories(pool))
        }
        StorageBackend::Memory => Ok(memory_repositories()),
    }
}

/// アプリケーション状態を作成する。
pub fn create_app_state(
    app_settings: AppSettings,
    repositories: DynRepositories,
    shutdown: CancellationToken,
) -> anyhow::Result<AppState> {
    let message_template = MessageTemplate::new(app_settings.notification.message_template.clone())
        .context("The notification message template is incorrect")?;
    Ok(AppState {
        app_settings,
        repositories,
        message_template,
        shutdown,
    })
}

pub fn get_subscriber<Sink>(
    name: String,
    log_level: log::Level,
    sink: Sink,
) -> impl Subscriber + Sync + Send
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));
    let formatting_layer = BunyanFormattingLayer::new(name, sink);
    Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer)
}

pub fn init_subscriber(subscriber: impl Subscriber + Sync + Send) -> anyhow::Result<()> {
    LogTracer::init().context("Failed to set logger")?;
    set_global_default(subscriber).context("Failed to set subscriber")
}
