mod notification;
mod passenger;

pub use notification::*;
pub use passenger::*;

use std::marker::PhantomData;
use std::sync::Arc;

use sqlx::{PgPool, Postgres, Transaction};

use domain::{DomainError, DomainErrorKind, DomainResult, repositories::Repositories};

use crate::DynRepositories;

/// PostgreSQLトランザクション
pub type PgTransaction<'a> = Transaction<'a, Postgres>;

/// PostgreSQLリポジトリ
pub struct PgRepository<T> {
    pub pool: PgPool,
    _marker: PhantomData<T>,
}

impl<T> PgRepository<T> {
    /// PostgreSQLリポジトリを作成する。
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }

    /// トランザクションを開始する。
    ///
    /// # 戻り値
    ///
    /// トランザクション
    pub async fn begin(&self) -> DomainResult<PgTransaction<'static>> {
        self.pool.begin().await.map_err(repository_error)
    }
}

/// トランザクションをコミットする。
///
/// # 引数
///
/// * `tx`: トランザクション
pub async fn commit(tx: PgTransaction<'_>) -> DomainResult<()> {
    tx.commit().await.map_err(repository_error)
}

/// SQLxのエラーをリポジトリエラーに変換する。
pub fn repository_error(e: sqlx::Error) -> DomainError {
    DomainError {
        kind: DomainErrorKind::Repository,
        messages: vec![e.to_string().into()],
        source: e.into(),
    }
}

/// 外部キー制約違反の場合は`true`を返す。
fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|e| e.is_foreign_key_violation())
}

/// PostgreSQLに保存するリポジトリコレクションを作成する。
pub fn pg_repositories(pool: PgPool) -> DynRepositories {
    Repositories {
        passenger_repository: Arc::new(PgPassengerRepository::new(pool.clone())),
        notification_repository: Arc::new(PgNotificationRepository::new(pool)),
    }
}
