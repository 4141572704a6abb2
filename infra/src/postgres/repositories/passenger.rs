use std::collections::HashMap;

use domain::{
    DomainError, DomainResult,
    models::{FlightId, Notification, Passenger, PassengerId},
    repositories::{PassengerInput, PassengerRepository},
};

use super::{PgRepository, PgTransaction, commit, notification::notifications_of, repository_error};

pub type PgPassengerRepository = PgRepository<Passenger>;

#[async_trait::async_trait]
impl PassengerRepository for PgPassengerRepository {
    /// 乗客をリストする。
    async fn list(&self) -> DomainResult<Vec<Passenger>> {
        let mut tx = self.begin().await?;
        let rows = sqlx::query_as::<_, PassengerRow>(
            r#"
            SELECT id, first_name, last_name, email, flight_id
            FROM passengers
            ORDER BY id
            "#,
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(repository_error)?;
        let passengers = with_notifications(&mut tx, rows).await?;
        commit(tx).await?;
        Ok(passengers)
    }

    /// フライトに搭乗する乗客をリストする。
    async fn list_by_flight(&self, flight_id: FlightId) -> DomainResult<Vec<Passenger>> {
        let mut tx = self.begin().await?;
        let rows = sqlx::query_as::<_, PassengerRow>(
            r#"
            SELECT id, first_name, last_name, email, flight_id
            FROM passengers
            WHERE flight_id = $1
            ORDER BY id
            "#,
        )
        .bind(flight_id.0)
        .fetch_all(&mut *tx)
        .await
        .map_err(repository_error)?;
        let passengers = with_notifications(&mut tx, rows).await?;
        commit(tx).await?;
        Ok(passengers)
    }

    /// 乗客をIDで取得する。
    async fn by_id(&self, id: PassengerId) -> DomainResult<Option<Passenger>> {
        let mut tx = self.begin().await?;
        let row = sqlx::query_as::<_, PassengerRow>(
            r#"
            SELECT id, first_name, last_name, email, flight_id
            FROM passengers
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&mut *tx)
        .await
        .map_err(repository_error)?;
        let passenger = match row {
            Some(row) => with_notifications(&mut tx, vec![row]).await?.pop(),
            None => None,
        };
        commit(tx).await?;
        Ok(passenger)
    }

    /// 乗客を新規作成する。
    async fn create(&self, input: PassengerInput) -> DomainResult<Passenger> {
        let mut tx = self.begin().await?;
        let row = sqlx::query_as::<_, PassengerRow>(
            r#"
            INSERT INTO passengers (first_name, last_name, email, flight_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, first_name, last_name, email, flight_id
            "#,
        )
        .bind(input.first_name.0)
        .bind(input.last_name.0)
        .bind(input.email.0)
        .bind(input.flight_id.0)
        .fetch_one(&mut *tx)
        .await
        .map_err(repository_error)?;
        commit(tx).await?;
        let (id, input) = row.split()?;
        Passenger::new(id, input, vec![])
    }

    /// 乗客と乗客が所有する通知を削除する。
    ///
    /// 乗客の行をロックしてから通知を削除するため、削除中に通知が追加されることはない。
    async fn delete(&self, id: PassengerId) -> DomainResult<bool> {
        let mut tx = self.begin().await?;
        let locked = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id FROM passengers WHERE id = $1 FOR UPDATE
            "#,
        )
        .bind(id.0)
        .fetch_optional(&mut *tx)
        .await
        .map_err(repository_error)?;
        if locked.is_none() {
            return Ok(false);
        }
        sqlx::query("DELETE FROM notifications WHERE passenger_id = $1")
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .map_err(repository_error)?;
        sqlx::query("DELETE FROM passengers WHERE id = $1")
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .map_err(repository_error)?;
        commit(tx).await?;
        Ok(true)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PassengerRow {
    id: i64,
    first_name: String,
    last_name: String,
    email: String,
    flight_id: i64,
}

impl PassengerRow {
    fn split(self) -> DomainResult<(PassengerId, PassengerInput)> {
        let input = PassengerInput {
            first_name: self.first_name.try_into()?,
            last_name: self.last_name.try_into()?,
            email: self.email.try_into()?,
            flight_id: self.flight_id.try_into()?,
        };
        Ok((self.id.into(), input))
    }
}

/// 乗客の行に、乗客が所有する通知を付けて乗客を構築する。
async fn with_notifications(
    tx: &mut PgTransaction<'_>,
    rows: Vec<PassengerRow>,
) -> DomainResult<Vec<Passenger>> {
    let ids = rows.iter().map(|row| row.id).collect();
    let mut owned: HashMap<PassengerId, Vec<Notification>> = HashMap::new();
    for notification in notifications_of(&mut **tx, ids).await? {
        owned
            .entry(notification.passenger_id)
            .or_default()
            .push(notification);
    }
    rows.into_iter()
        .map(|row| {
            let (id, input) = row.split()?;
            Passenger::new(id, input, owned.remove(&id).unwrap_or_default())
        })
        .collect::<Result<Vec<_>, DomainError>>()
}
