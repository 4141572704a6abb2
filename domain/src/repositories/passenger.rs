use std::sync::Arc;

use crate::{
    DomainResult,
    models::{Email, FirstName, FlightId, LastName, Passenger, PassengerId},
};

/// 乗客の登録内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassengerInput {
    pub first_name: FirstName,
    pub last_name: LastName,
    pub email: Email,
    pub flight_id: FlightId,
}

/// 乗客リポジトリ
///
/// 乗客を返すメソッドは、乗客が所有する通知をすべて読み込んだ状態で返す。
#[async_trait::async_trait]
pub trait PassengerRepository: Send + Sync {
    /// 乗客をリストする。
    async fn list(&self) -> DomainResult<Vec<Passenger>>;

    /// フライトに搭乗する乗客をリストする。
    async fn list_by_flight(&self, flight_id: FlightId) -> DomainResult<Vec<Passenger>>;

    /// 乗客をIDで取得する。
    async fn by_id(&self, id: PassengerId) -> DomainResult<Option<Passenger>>;

    /// 乗客を新規作成する。
    async fn create(&self, input: PassengerInput) -> DomainResult<Passenger>;

    /// 乗客と乗客が所有する通知を削除する。
    ///
    /// 乗客が存在しない場合は`false`を返す。
    async fn delete(&self, id: PassengerId) -> DomainResult<bool>;
}

#[async_trait::async_trait]
impl<R> PassengerRepository for Arc<R>
where
    R: PassengerRepository + ?Sized,
{
    async fn list(&self) -> DomainResult<Vec<Passenger>> {
        (**self).list().await
    }

    async fn list_by_flight(&self, flight_id: FlightId) -> DomainResult<Vec<Passenger>> {
        (**self).list_by_flight(flight_id).await
    }

    async fn by_id(&self, id: PassengerId) -> DomainResult<Option<Passenger>> {
        (**self).by_id(id).await
    }

    async fn create(&self, input: PassengerInput) -> DomainResult<Passenger> {
        (**self).create(input).await
    }

    async fn delete(&self, id: PassengerId) -> DomainResult<bool> {
        (**self).delete(id).await
    }
}
