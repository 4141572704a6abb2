use enum_display::EnumDisplay;
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Deserializer};
use sqlx::postgres::PgConnectOptions;

/// アプリケーション設定
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    /// HTTPサーバー設定
    pub http: HttpSettings,
    /// データベース設定
    pub database: DatabaseSettings,
    /// ストレージ設定
    pub storage: StorageSettings,
    /// 通知設定
    pub notification: NotificationSettings,
    /// ログ設定
    pub log: LogSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, EnumDisplay)]
#[serde(rename = "protocol")]
#[serde(rename_all = "lowercase")]
#[enum_display(case = "Lower")]
pub enum HttpProtocol {
    /// HTTPプロトコル
    Http,
    /// HTTPSプロトコル
    Https,
}

/// HTTPサーバー設定
#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    /// プロトコル
    pub protocol: HttpProtocol,
    /// ホスト名
    pub host: String,
    /// ポート番号
    pub port: u16,
}

/// データベース設定
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// ホスト名
    pub host: String,
    /// ポート番号
    pub port: u16,
    /// ユーザー名
    pub user: String,
    /// パスワード
    pub password: SecretString,
    /// データベース名
    pub name: String,
    /// 最大接続数
    pub max_connections: u32,
    /// 接続タイムアウト（秒）
    pub connection_timeout: u64,
}

/// ストレージの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, EnumDisplay)]
#[serde(rename_all = "lowercase")]
#[enum_display(case = "Lower")]
pub enum StorageBackend {
    /// PostgreSQL
    Postgres,
    /// プロセス内メモリ
    Memory,
}

/// ストレージ設定
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StorageSettings {
    /// 乗客と通知を保存するストレージ
    pub backend: StorageBackend,
}

/// 通知設定
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationSettings {
    /// フライト欠航通知の既定のメッセージテンプレート
    ///
    /// `{flight_id}`、`{first_name}`、`{last_name}`を置換できる。
    pub message_template: String,
}

/// ログ設定
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LogSettings {
    /// `RUST_LOG`環境変数が設定されていない場合のログレベル
    ///
    /// 大文字と小文字を区別しない（`info`、`INFO`）。
    #[serde(deserialize_with = "deserialize_log_level")]
    pub level: log::Level,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<log::Level, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    value.parse().map_err(serde::de::Error::custom)
}

impl HttpSettings {
    /// バインドするアドレス（ホスト名とポート番号）を返す。
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseSettings {
    /// データベースの接続オプションを返す。
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(self.password.expose_secret())
            .database(&self.name)
    }
}
