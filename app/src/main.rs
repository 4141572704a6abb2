use anyhow::Context as _;
use tokio_util::sync::CancellationToken;

use app::{
    bind_address, create_app_state, create_repositories, get_subscriber, init_subscriber,
    load_app_settings, routes::create_router,
};

const SERVICE_NAME: &str = "passenger-service";

/// アプリケーションエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // アプリケーション設定を読み込み
    let app_settings = load_app_settings("app_settings.toml")?;

    // ログを設定
    let subscriber = get_subscriber(
        SERVICE_NAME.to_string(),
        app_settings.log.level,
        std::io::stdout,
    );
    init_subscriber(subscriber)?;
    tracing::info!(
        storage = %app_settings.storage.backend,
        "App settings: {:?}",
        app_settings
    );

    // アプリケーション状態を作成
    let repositories = create_repositories(&app_settings).await?;
    let shutdown = CancellationToken::new();
    let app_state = create_app_state(app_settings.clone(), repositories, shutdown.clone())?;
    let router = create_router(app_state);

    // HTTPサーバーを起動
    let (listener, port) = bind_address(&app_settings.http).await?;
    tracing::info!(
        "HTTP server is running on {}://{}:{}",
        app_settings.http.protocol,
        app_settings.http.host,
        port
    );
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("Failed to start the HTTP server")?;

    Ok(())
}

/// Ctrl+Cを受け取ったら、停止トークンをキャンセルする。
///
/// 実行中のフライト欠航通知は、停止トークンのキャンセルを検知して中止される。
async fn shutdown_signal(shutdown: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Shutdown signal received");
            shutdown.cancel();
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for the shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
