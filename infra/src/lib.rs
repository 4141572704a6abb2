pub mod http;
pub mod memory;
pub mod postgres;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use domain::{
    models::MessageTemplate,
    repositories::{NotificationRepository, PassengerRepository, Repositories},
};
use settings::AppSettings;

/// 実行時に選択したストレージのリポジトリコレクション
pub type DynRepositories =
    Repositories<Arc<dyn PassengerRepository>, Arc<dyn NotificationRepository>>;

#[derive(Clone)]
pub struct AppState {
    pub app_settings: AppSettings,
    pub repositories: DynRepositories,
    /// フライト欠航通知の既定のメッセージテンプレート
    pub message_template: MessageTemplate,
    /// サーバーの停止を通知するトークン
    pub shutdown: CancellationToken,
}
