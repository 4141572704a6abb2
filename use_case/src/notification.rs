use std::future::Future;

use tokio_util::sync::CancellationToken;

use domain::{
    DomainError, DomainErrorKind, DomainResult, domain_error,
    models::{
        FlightCancellationReport, FlightId, MessageTemplate, Notification, NotificationContent,
        PassengerId,
    },
    repositories::{NotificationInput, NotificationRepository, PassengerRepository},
};

/// 通知ユースケース
pub struct NotificationUseCase<PR, NR>
where
    PR: PassengerRepository,
    NR: NotificationRepository,
{
    /// 乗客リポジトリ
    pub passenger_repository: PR,
    /// 通知リポジトリ
    pub notification_repository: NR,
}

impl<PR, NR> NotificationUseCase<PR, NR>
where
    PR: PassengerRepository,
    NR: NotificationRepository,
{
    /// 通知ユースケースを作成する。
    pub fn new(passenger_repository: PR, notification_repository: NR) -> Self {
        Self {
            passenger_repository,
            notification_repository,
        }
    }

    /// 乗客の通知をリストする。
    ///
    /// 通知がない場合は空のリストを返す。
    pub async fn list(&self, passenger_id: PassengerId) -> DomainResult<Vec<Notification>> {
        self.notification_repository
            .list_by_passenger(passenger_id)
            .await
    }

    /// すべての通知を削除して、削除した件数を返す。
    pub async fn delete_all(&self) -> DomainResult<u64> {
        let count = self.notification_repository.delete_all().await?;
        tracing::info!(count, "all notifications deleted");
        Ok(count)
    }

    /// 乗客に通知を送信する。
    ///
    /// 通知の宛先は、乗客の現在のEメールアドレスである。
    pub async fn notify_passenger(
        &self,
        passenger_id: PassengerId,
        content: NotificationContent,
    ) -> DomainResult<Notification> {
        let passenger = self
            .passenger_repository
            .by_id(passenger_id)
            .await?
            .ok_or_else(|| {
                domain_error(
                    DomainErrorKind::NotFound,
                    format!("Passenger with id {} not found", passenger_id),
                )
            })?;
        let input = NotificationInput {
            passenger_id: passenger.id,
            email: passenger.email,
            content,
        };
        self.notification_repository.create(input).await
    }

    /// フライトが欠航したことを、そのフライトに搭乗するすべての乗客に通知する。
    ///
    /// 乗客ごとに1件の通知を作成する。乗客がいない場合は通知を作成せずに成功する。
    /// 同じフライトで複数回呼び出した場合、その都度通知を作成する。
    ///
    /// 通知は1回の操作でまとめて作成するため、失敗した場合は1件も作成されない。
    /// 乗客をリストしてから通知を作成するまでに削除された乗客には通知しない。
    /// `cancel`がキャンセルされたことを通知の作成完了前に検知した場合は、作成を中止して
    /// `Cancelled`エラーを返す。以前の呼び出しで作成された通知は残る。
    pub async fn notify_flight_cancelled(
        &self,
        flight_id: FlightId,
        template: &MessageTemplate,
        cancel: &CancellationToken,
    ) -> DomainResult<FlightCancellationReport> {
        let passengers = until_cancelled(
            cancel,
            flight_id,
            self.passenger_repository.list_by_flight(flight_id),
        )
        .await?;
        if passengers.is_empty() {
            tracing::info!(%flight_id, "no passengers to notify");
            return Ok(FlightCancellationReport {
                flight_id,
                notifications: vec![],
            });
        }

        let inputs = passengers
            .into_iter()
            .map(|passenger| {
                let content =
                    template.render(flight_id, &passenger.first_name, &passenger.last_name)?;
                Ok(NotificationInput {
                    passenger_id: passenger.id,
                    email: passenger.email,
                    content,
                })
            })
            .collect::<DomainResult<Vec<_>>>()?;
        let matched = inputs.len();

        let notifications = until_cancelled(
            cancel,
            flight_id,
            self.notification_repository.create_many(inputs),
        )
        .await
        .inspect_err(|e| {
            if e.kind == DomainErrorKind::Repository {
                tracing::error!(%flight_id, error = %e, "failed to notify passengers");
            }
        })?;
        tracing::info!(
            %flight_id,
            matched,
            created = notifications.len(),
            "passengers notified of flight cancellation"
        );

        Ok(FlightCancellationReport {
            flight_id,
            notifications,
        })
    }
}

/// `future`を完了するまで実行する。
///
/// 完了前に`cancel`がキャンセルされた場合は、`future`を破棄して`Cancelled`エラーを返す。
async fn until_cancelled<T>(
    cancel: &CancellationToken,
    flight_id: FlightId,
    future: impl Future<Output = DomainResult<T>>,
) -> DomainResult<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::warn!(%flight_id, "flight cancellation notice was cancelled");
            Err(cancelled_error(flight_id))
        }
        result = future => result,
    }
}

fn cancelled_error(flight_id: FlightId) -> DomainError {
    domain_error(
        DomainErrorKind::Cancelled,
        format!(
            "Notifying passengers of flight {} was cancelled",
            flight_id
        ),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use domain::{models::Passenger, repositories::PassengerInput};

    use super::*;
    use crate::fakes::{FakeStore, new_passenger};
    use crate::passenger::PassengerUseCase;

    type UseCase = NotificationUseCase<Arc<FakeStore>, Arc<FakeStore>>;

    fn use_case(store: &Arc<FakeStore>) -> UseCase {
        NotificationUseCase::new(store.clone(), store.clone())
    }

    fn template() -> MessageTemplate {
        MessageTemplate::new(String::from(
            "Dear {first_name}, flight {flight_id} has been cancelled",
        ))
        .unwrap()
    }

    async fn create_passenger(
        store: &Arc<FakeStore>,
        first_name: &str,
        flight_id: i64,
    ) -> Passenger {
        let email = format!("{}@x.com", first_name.to_lowercase());
        PassengerUseCase::new(store.clone())
            .create(new_passenger(first_name, &email, flight_id))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn fan_out_notifies_only_passengers_of_the_flight() -> anyhow::Result<()> {
        let store = Arc::new(FakeStore::default());
        let p1 = create_passenger(&store, "John", 1).await;
        let p2 = create_passenger(&store, "Jane", 1).await;
        let p3 = create_passenger(&store, "Jack", 2).await;
        let use_case = use_case(&store);

        let report = use_case
            .notify_flight_cancelled(FlightId(1), &template(), &CancellationToken::new())
            .await?;

        assert_eq!(report.flight_id, FlightId(1));
        assert_eq!(report.notifications.len(), 2);
        for passenger in [&p1, &p2] {
            let notifications = use_case.list(passenger.id).await?;
            assert_eq!(notifications.len(), 1);
            assert_eq!(notifications[0].email, passenger.email);
            assert_eq!(
                &*notifications[0].content,
                format!("Dear {}, flight 1 has been cancelled", &*passenger.first_name)
            );
        }
        assert!(use_case.list(p3.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn fan_out_without_passengers_succeeds() -> anyhow::Result<()> {
        let store = Arc::new(FakeStore::default());
        create_passenger(&store, "John", 1).await;
        let use_case = use_case(&store);

        let report = use_case
            .notify_flight_cancelled(FlightId(99), &template(), &CancellationToken::new())
            .await?;

        assert!(report.notifications.is_empty());
        assert_eq!(store.notification_count().await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn fan_out_is_not_deduplicated_across_calls() -> anyhow::Result<()> {
        let store = Arc::new(FakeStore::default());
        create_passenger(&store, "John", 1).await;
        create_passenger(&store, "Jane", 1).await;
        let use_case = use_case(&store);
        let cancel = CancellationToken::new();

        use_case
            .notify_flight_cancelled(FlightId(1), &template(), &cancel)
            .await?;
        use_case
            .notify_flight_cancelled(FlightId(1), &template(), &cancel)
            .await?;

        assert_eq!(store.notification_count().await, 4);
        Ok(())
    }

    #[tokio::test]
    async fn failed_fan_out_creates_no_notifications() {
        let store = Arc::new(FakeStore::failing());
        create_passenger(&store, "John", 1).await;
        create_passenger(&store, "Jane", 1).await;
        let use_case = use_case(&store);

        let result = use_case
            .notify_flight_cancelled(FlightId(1), &template(), &CancellationToken::new())
            .await;

        assert_eq!(result.unwrap_err().kind, DomainErrorKind::Repository);
        assert_eq!(store.notification_count().await, 0);
    }

    #[tokio::test]
    async fn fan_out_cancelled_before_start_creates_nothing() {
        let store = Arc::new(FakeStore::default());
        create_passenger(&store, "John", 1).await;
        let use_case = use_case(&store);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = use_case
            .notify_flight_cancelled(FlightId(1), &template(), &cancel)
            .await;

        assert_eq!(result.unwrap_err().kind, DomainErrorKind::Cancelled);
        assert_eq!(store.notification_count().await, 0);
    }

    #[tokio::test]
    async fn fan_out_cancelled_in_flight_keeps_committed_notifications() -> anyhow::Result<()> {
        let store = Arc::new(FakeStore::with_delay(Duration::from_millis(200)));
        create_passenger(&store, "John", 1).await;
        create_passenger(&store, "Jane", 1).await;
        let use_case = use_case(&store);

        // 先に完了した呼び出しの通知
        use_case
            .notify_flight_cancelled(FlightId(1), &template(), &CancellationToken::new())
            .await?;
        assert_eq!(store.notification_count().await, 2);

        let cancel = CancellationToken::new();
        let canceller = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                cancel.cancel();
            })
        };
        let result = use_case
            .notify_flight_cancelled(FlightId(1), &template(), &cancel)
            .await;
        canceller.await?;

        assert_eq!(result.unwrap_err().kind, DomainErrorKind::Cancelled);
        assert_eq!(store.notification_count().await, 2);
        Ok(())
    }

    /// 乗客をリストした直後に、別の乗客を削除する乗客リポジトリ
    struct DeleteAfterListing {
        store: Arc<FakeStore>,
        deleted: PassengerId,
    }

    #[async_trait::async_trait]
    impl PassengerRepository for DeleteAfterListing {
        async fn list(&self) -> DomainResult<Vec<Passenger>> {
            self.store.list().await
        }

        async fn list_by_flight(&self, flight_id: FlightId) -> DomainResult<Vec<Passenger>> {
            let passengers = self.store.list_by_flight(flight_id).await?;
            PassengerRepository::delete(&*self.store, self.deleted).await?;
            Ok(passengers)
        }

        async fn by_id(&self, id: PassengerId) -> DomainResult<Option<Passenger>> {
            self.store.by_id(id).await
        }

        async fn create(&self, input: PassengerInput) -> DomainResult<Passenger> {
            PassengerRepository::create(&*self.store, input).await
        }

        async fn delete(&self, id: PassengerId) -> DomainResult<bool> {
            PassengerRepository::delete(&*self.store, id).await
        }
    }

    #[tokio::test]
    async fn fan_out_still_notifies_when_a_passenger_is_deleted_meanwhile() -> anyhow::Result<()> {
        let store = Arc::new(FakeStore::default());
        let john = create_passenger(&store, "John", 1).await;
        let jane = create_passenger(&store, "Jane", 1).await;
        let use_case = NotificationUseCase::new(
            DeleteAfterListing {
                store: store.clone(),
                deleted: jane.id,
            },
            store.clone(),
        );

        let report = use_case
            .notify_flight_cancelled(FlightId(1), &template(), &CancellationToken::new())
            .await?;

        assert_eq!(report.notifications.len(), 1);
        assert_eq!(report.notifications[0].passenger_id, john.id);
        assert_eq!(use_case.list(john.id).await?.len(), 1);
        assert!(use_case.list(jane.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn notify_passenger_copies_current_email() -> anyhow::Result<()> {
        let store = Arc::new(FakeStore::default());
        let passenger = create_passenger(&store, "John", 1).await;
        let use_case = use_case(&store);

        let content = NotificationContent::new(String::from("Gate changed"))?;
        let notification = use_case.notify_passenger(passenger.id, content).await?;

        assert_eq!(notification.passenger_id, passenger.id);
        assert_eq!(notification.email, passenger.email);
        Ok(())
    }

    #[tokio::test]
    async fn notify_unknown_passenger_is_not_found() {
        let store = Arc::new(FakeStore::default());
        let use_case = use_case(&store);

        let content = NotificationContent::new(String::from("Gate changed")).unwrap();
        let result = use_case.notify_passenger(PassengerId::new(99), content).await;

        assert_eq!(result.unwrap_err().kind, DomainErrorKind::NotFound);
    }

    #[tokio::test]
    async fn list_for_passenger_without_notifications_is_empty() -> anyhow::Result<()> {
        let store = Arc::new(FakeStore::default());
        let use_case = use_case(&store);

        assert!(use_case.list(PassengerId::new(1)).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn delete_all_removes_every_notification() -> anyhow::Result<()> {
        let store = Arc::new(FakeStore::default());
        create_passenger(&store, "John", 1).await;
        create_passenger(&store, "Jane", 2).await;
        let use_case = use_case(&store);
        let cancel = CancellationToken::new();
        use_case
            .notify_flight_cancelled(FlightId(1), &template(), &cancel)
            .await?;
        use_case
            .notify_flight_cancelled(FlightId(2), &template(), &cancel)
            .await?;

        assert_eq!(use_case.delete_all().await?, 2);
        assert_eq!(store.notification_count().await, 0);
        Ok(())
    }
}
