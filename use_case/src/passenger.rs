use domain::{
    DomainResult,
    models::{NewPassenger, Passenger, PassengerId, validate_new_passenger},
    repositories::PassengerRepository,
};

/// 乗客ユースケース
pub struct PassengerUseCase<R>
where
    R: PassengerRepository,
{
    /// 乗客リポジトリ
    pub passenger_repository: R,
}

impl<R> PassengerUseCase<R>
where
    R: PassengerRepository,
{
    /// 乗客ユースケースを作成する。
    pub fn new(passenger_repository: R) -> Self {
        Self {
            passenger_repository,
        }
    }

    /// 乗客をリストする。
    pub async fn list(&self) -> DomainResult<Vec<Passenger>> {
        self.passenger_repository.list().await
    }

    /// 乗客を登録する。
    ///
    /// 登録データの検証に失敗した場合は、何も登録せずに検証エラーを返す。
    pub async fn create(&self, new_passenger: NewPassenger) -> DomainResult<Passenger> {
        let input = validate_new_passenger(new_passenger)?;
        let passenger = self.passenger_repository.create(input).await?;
        tracing::info!(passenger_id = %passenger.id, flight_id = %passenger.flight_id, "passenger created");
        Ok(passenger)
    }

    /// 乗客を取得する。
    ///
    /// 乗客が存在しない場合は`None`を返す。
    pub async fn by_id(&self, id: PassengerId) -> DomainResult<Option<Passenger>> {
        self.passenger_repository.by_id(id).await
    }

    /// 乗客を削除する。
    ///
    /// 乗客が所有する通知も削除する。乗客が存在しない場合は`false`を返す。
    pub async fn delete(&self, id: PassengerId) -> DomainResult<bool> {
        let deleted = self.passenger_repository.delete(id).await?;
        if deleted {
            tracing::info!(passenger_id = %id, "passenger deleted");
        }
        Ok(deleted)
    }
}
