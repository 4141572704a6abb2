//! プロセス内メモリに保存するリポジトリ
//!
//! 乗客と通知は1つの状態を共有し、書き込みは1つの書き込みロックの中で完了する。
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::RwLock;

use domain::{
    DomainErrorKind, DomainResult, domain_error,
    models::{FlightId, Notification, NotificationId, Passenger, PassengerId},
    repositories::{
        NotificationInput, NotificationRepository, PassengerInput, PassengerRepository,
        Repositories,
    },
};

use crate::DynRepositories;

#[derive(Default)]
struct MemoryState {
    last_passenger_id: i64,
    last_notification_id: i64,
    passengers: BTreeMap<i64, PassengerInput>,
    notifications: BTreeMap<i64, Notification>,
}

impl MemoryState {
    fn passenger(&self, id: i64, input: &PassengerInput) -> DomainResult<Passenger> {
        let notifications = self
            .notifications
            .values()
            .filter(|n| n.passenger_id.0 == id)
            .cloned()
            .collect();
        Passenger::new(id.into(), input.clone(), notifications)
    }

    fn insert_notification(&mut self, input: NotificationInput, now: OffsetDateTime) -> Notification {
        self.last_notification_id += 1;
        let notification = Notification {
            id: NotificationId::new(self.last_notification_id),
            content: input.content,
            email: input.email,
            passenger_id: input.passenger_id,
            created_at: now,
        };
        self.notifications
            .insert(notification.id.0, notification.clone());
        notification
    }
}

/// メモリストア
///
/// クローンしたストアは同じ状態を共有する。
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

/// メモリリポジトリ
pub struct MemoryRepository<T> {
    store: MemoryStore,
    _marker: PhantomData<T>,
}

impl<T> MemoryRepository<T> {
    /// メモリリポジトリを作成する。
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }
}

pub type MemoryPassengerRepository = MemoryRepository<Passenger>;
pub type MemoryNotificationRepository = MemoryRepository<Notification>;

/// メモリに保存するリポジトリコレクションを作成する。
pub fn memory_repositories() -> DynRepositories {
    let store = MemoryStore::default();
    Repositories {
        passenger_repository: Arc::new(MemoryPassengerRepository::new(store.clone())),
        notification_repository: Arc::new(MemoryNotificationRepository::new(store)),
    }
}

#[async_trait::async_trait]
impl PassengerRepository for MemoryPassengerRepository {
    async fn list(&self) -> DomainResult<Vec<Passenger>> {
        let state = self.store.state.read().await;
        state
            .passengers
            .iter()
            .map(|(id, input)| state.passenger(*id, input))
            .collect()
    }

    async fn list_by_flight(&self, flight_id: FlightId) -> DomainResult<Vec<Passenger>> {
        let state = self.store.state.read().await;
        state
            .passengers
            .iter()
            .filter(|(_, input)| input.flight_id == flight_id)
            .map(|(id, input)| state.passenger(*id, input))
            .collect()
    }

    async fn by_id(&self, id: PassengerId) -> DomainResult<Option<Passenger>> {
        let state = self.store.state.read().await;
        state
            .passengers
            .get(&id.0)
            .map(|input| state.passenger(id.0, input))
            .transpose()
    }

    async fn create(&self, input: PassengerInput) -> DomainResult<Passenger> {
        let mut state = self.store.state.write().await;
        state.last_passenger_id += 1;
        let id = state.last_passenger_id;
        state.passengers.insert(id, input.clone());
        Passenger::new(id.into(), input, vec![])
    }

    async fn delete(&self, id: PassengerId) -> DomainResult<bool> {
        let mut state = self.store.state.write().await;
        if state.passengers.remove(&id.0).is_none() {
            return Ok(false);
        }
        state.notifications.retain(|_, n| n.passenger_id != id);
        Ok(true)
    }
}

#[async_trait::async_trait]
impl NotificationRepository for MemoryNotificationRepository {
    async fn list_by_passenger(
        &self,
        passenger_id: PassengerId,
    ) -> DomainResult<Vec<Notification>> {
        let state = self.store.state.read().await;
        Ok(state
            .notifications
            .values()
            .filter(|n| n.passenger_id == passenger_id)
            .cloned()
            .collect())
    }

    async fn create(&self, input: NotificationInput) -> DomainResult<Notification> {
        let mut state = self.store.state.write().await;
        if !state.passengers.contains_key(&input.passenger_id.0) {
            return Err(domain_error(
                DomainErrorKind::NotFound,
                format!("Passenger with id {} not found", input.passenger_id),
            ));
        }
        Ok(state.insert_notification(input, OffsetDateTime::now_utc()))
    }

    async fn create_many(&self, inputs: Vec<NotificationInput>) -> DomainResult<Vec<Notification>> {
        let mut state = self.store.state.write().await;
        let now = OffsetDateTime::now_utc();
        let inputs = inputs
            .into_iter()
            .filter(|input| state.passengers.contains_key(&input.passenger_id.0))
            .collect::<Vec<_>>();
        Ok(inputs
            .into_iter()
            .map(|input| state.insert_notification(input, now))
            .collect())
    }

    async fn delete_all(&self) -> DomainResult<u64> {
        let mut state = self.store.state.write().await;
        let count = state.notifications.len() as u64;
        state.notifications.clear();
        Ok(count)
    }
}
