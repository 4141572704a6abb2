use std::sync::Arc;

use crate::{
    DomainResult,
    models::{Email, Notification, NotificationContent, PassengerId},
};

/// 通知の登録内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationInput {
    /// 通知を所有する乗客のID
    pub passenger_id: PassengerId,
    /// 宛先のEメールアドレス
    pub email: Email,
    /// 内容
    pub content: NotificationContent,
}

/// 通知リポジトリ
///
/// 通知は更新できない。
#[async_trait::async_trait]
pub trait NotificationRepository: Send + Sync {
    /// 乗客の通知をリストする。
    async fn list_by_passenger(&self, passenger_id: PassengerId)
    -> DomainResult<Vec<Notification>>;

    /// 通知を新規作成する。
    ///
    /// 乗客が存在しない場合は`NotFound`エラーを返す。
    async fn create(&self, input: NotificationInput) -> DomainResult<Notification>;

    /// 複数の通知を1回の操作で新規作成する。
    ///
    /// すべての通知を作成するか、1件も作成しないかのどちらかになる。
    /// 書き込む時点で存在しない乗客の通知は作成せずに読み飛ばす。
    async fn create_many(&self, inputs: Vec<NotificationInput>) -> DomainResult<Vec<Notification>>;

    /// すべての通知を削除して、削除した件数を返す。
    async fn delete_all(&self) -> DomainResult<u64>;
}

#[async_trait::async_trait]
impl<R> NotificationRepository for Arc<R>
where
    R: NotificationRepository + ?Sized,
{
    async fn list_by_passenger(
        &self,
        passenger_id: PassengerId,
    ) -> DomainResult<Vec<Notification>> {
        (**self).list_by_passenger(passenger_id).await
    }

    async fn create(&self, input: NotificationInput) -> DomainResult<Notification> {
        (**self).create(input).await
    }

    async fn create_many(&self, inputs: Vec<NotificationInput>) -> DomainResult<Vec<Notification>> {
        (**self).create_many(inputs).await
    }

    async fn delete_all(&self) -> DomainResult<u64> {
        (**self).delete_all().await
    }
}
