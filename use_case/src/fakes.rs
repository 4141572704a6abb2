//! ユースケースのテストで使用するリポジトリの偽物
use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::Mutex;

use domain::{
    DomainErrorKind, DomainResult, domain_error,
    models::{FlightId, NewPassenger, Notification, NotificationId, Passenger, PassengerId},
    repositories::{NotificationInput, NotificationRepository, PassengerInput, PassengerRepository},
};

#[derive(Default)]
struct State {
    last_id: i64,
    passengers: Vec<(PassengerId, PassengerInput)>,
    notifications: Vec<Notification>,
}

/// 乗客リポジトリと通知リポジトリを兼ねる偽物
#[derive(Default)]
pub struct FakeStore {
    state: Mutex<State>,
    /// `create_many`を失敗させる
    pub fail_create_many: bool,
    /// `create_many`が書き込む前に待機する時間
    pub create_many_delay: Option<Duration>,
}

pub fn new_passenger(first_name: &str, email: &str, flight_id: i64) -> NewPassenger {
    NewPassenger {
        first_name: Some(first_name.to_string()),
        last_name: Some(String::from("Doe")),
        email: Some(email.to_string()),
        flight_id: Some(flight_id),
    }
}

impl FakeStore {
    /// `create_many`が常に失敗するストアを作成する。
    pub fn failing() -> Self {
        Self {
            fail_create_many: true,
            ..Self::default()
        }
    }

    /// `create_many`が書き込む前に`delay`だけ待機するストアを作成する。
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            create_many_delay: Some(delay),
            ..Self::default()
        }
    }

    pub async fn notification_count(&self) -> usize {
        self.state.lock().await.notifications.len()
    }

    fn assemble(state: &State, id: PassengerId, input: &PassengerInput) -> DomainResult<Passenger> {
        let notifications = state
            .notifications
            .iter()
            .filter(|n| n.passenger_id == id)
            .cloned()
            .collect();
        Passenger::new(id, input.clone(), notifications)
    }

    fn insert(state: &mut State, input: NotificationInput) -> DomainResult<Notification> {
        if !state.passengers.iter().any(|(id, _)| *id == input.passenger_id) {
            return Err(domain_error(DomainErrorKind::NotFound, "Passenger not found"));
        }
        state.last_id += 1;
        let notification = Notification {
            id: NotificationId::new(state.last_id),
            content: input.content,
            email: input.email,
            passenger_id: input.passenger_id,
            created_at: OffsetDateTime::now_utc(),
        };
        state.notifications.push(notification.clone());
        Ok(notification)
    }
}

#[async_trait::async_trait]
impl PassengerRepository for FakeStore {
    async fn list(&self) -> DomainResult<Vec<Passenger>> {
        let state = self.state.lock().await;
        state
            .passengers
            .iter()
            .map(|(id, input)| Self::assemble(&state, *id, input))
            .collect()
    }

    async fn list_by_flight(&self, flight_id: FlightId) -> DomainResult<Vec<Passenger>> {
        let state = self.state.lock().await;
        state
            .passengers
            .iter()
            .filter(|(_, input)| input.flight_id == flight_id)
            .map(|(id, input)| Self::assemble(&state, *id, input))
            .collect()
    }

    async fn by_id(&self, id: PassengerId) -> DomainResult<Option<Passenger>> {
        let state = self.state.lock().await;
        state
            .passengers
            .iter()
            .find(|(passenger_id, _)| *passenger_id == id)
            .map(|(id, input)| Self::assemble(&state, *id, input))
            .transpose()
    }

    async fn create(&self, input: PassengerInput) -> DomainResult<Passenger> {
        let mut state = self.state.lock().await;
        state.last_id += 1;
        let id = PassengerId::new(state.last_id);
        state.passengers.push((id, input.clone()));
        Passenger::new(id, input, vec![])
    }

    async fn delete(&self, id: PassengerId) -> DomainResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.passengers.len();
        state.passengers.retain(|(passenger_id, _)| *passenger_id != id);
        if state.passengers.len() == before {
            return Ok(false);
        }
        state.notifications.retain(|n| n.passenger_id != id);
        Ok(true)
    }
}

#[async_trait::async_trait]
impl NotificationRepository for FakeStore {
    async fn list_by_passenger(
        &self,
        passenger_id: PassengerId,
    ) -> DomainResult<Vec<Notification>> {
        let state = self.state.lock().await;
        Ok(state
            .notifications
            .iter()
            .filter(|n| n.passenger_id == passenger_id)
            .cloned()
            .collect())
    }

    async fn create(&self, input: NotificationInput) -> DomainResult<Notification> {
        let mut state = self.state.lock().await;
        Self::insert(&mut state, input)
    }

    async fn create_many(&self, inputs: Vec<NotificationInput>) -> DomainResult<Vec<Notification>> {
        if let Some(delay) = self.create_many_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_create_many {
            return Err(domain_error(
                DomainErrorKind::Repository,
                "connection reset by peer",
            ));
        }
        let mut state = self.state.lock().await;
        let inputs = inputs
            .into_iter()
            .filter(|input| state.passengers.iter().any(|(id, _)| *id == input.passenger_id))
            .collect::<Vec<_>>();
        inputs
            .into_iter()
            .map(|input| Self::insert(&mut state, input))
            .collect()
    }

    async fn delete_all(&self) -> DomainResult<u64> {
        let mut state = self.state.lock().await;
        let count = state.notifications.len() as u64;
        state.notifications.clear();
        Ok(count)
    }
}
