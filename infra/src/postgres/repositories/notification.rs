use std::collections::HashSet;

use sqlx::PgConnection;
use time::OffsetDateTime;

use domain::{
    DomainError, DomainErrorKind, DomainResult, domain_error,
    models::{Notification, PassengerId},
    repositories::{NotificationInput, NotificationRepository},
};

use super::{PgRepository, commit, is_foreign_key_violation, repository_error};

pub type PgNotificationRepository = PgRepository<Notification>;

#[async_trait::async_trait]
impl NotificationRepository for PgNotificationRepository {
    /// 乗客の通知をリストする。
    async fn list_by_passenger(
        &self,
        passenger_id: PassengerId,
    ) -> DomainResult<Vec<Notification>> {
        sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, passenger_id, email, content, created_at
            FROM notifications
            WHERE passenger_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(passenger_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(repository_error)?
        .into_iter()
        .map(Notification::try_from)
        .collect()
    }

    /// 通知を新規作成する。
    async fn create(&self, input: NotificationInput) -> DomainResult<Notification> {
        let passenger_id = input.passenger_id;
        let mut tx = self.begin().await?;
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            INSERT INTO notifications (passenger_id, email, content, created_at)
            VALUES ($1, $2, $3, CURRENT_TIMESTAMP)
            RETURNING id, passenger_id, email, content, created_at
            "#,
        )
        .bind(input.passenger_id.0)
        .bind(input.email.0)
        .bind(input.content.0)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| insert_error(e, passenger_id))?;
        commit(tx).await?;
        Notification::try_from(row)
    }

    /// 複数の通知を1つのINSERT文で新規作成する。
    ///
    /// 存在する乗客の行を共有ロックしてから書き込むため、書き込み中に乗客が削除されることはない。
    /// ロックする前に削除された乗客の通知は作成しない。
    async fn create_many(&self, inputs: Vec<NotificationInput>) -> DomainResult<Vec<Notification>> {
        if inputs.is_empty() {
            return Ok(vec![]);
        }
        let mut owner_ids = inputs.iter().map(|i| i.passenger_id.0).collect::<Vec<_>>();
        owner_ids.sort_unstable();
        owner_ids.dedup();

        let mut tx = self.begin().await?;
        let existing = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id FROM passengers
            WHERE id = ANY($1)
            ORDER BY id
            FOR KEY SHARE
            "#,
        )
        .bind(owner_ids)
        .fetch_all(&mut *tx)
        .await
        .map_err(repository_error)?
        .into_iter()
        .collect::<HashSet<_>>();

        let mut passenger_ids = Vec::with_capacity(inputs.len());
        let mut emails = Vec::with_capacity(inputs.len());
        let mut contents = Vec::with_capacity(inputs.len());
        for input in inputs
            .into_iter()
            .filter(|i| existing.contains(&i.passenger_id.0))
        {
            passenger_ids.push(input.passenger_id.0);
            emails.push(input.email.0);
            contents.push(input.content.0);
        }
        if passenger_ids.is_empty() {
            commit(tx).await?;
            return Ok(vec![]);
        }

        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            INSERT INTO notifications (passenger_id, email, content, created_at)
            SELECT passenger_id, email, content, CURRENT_TIMESTAMP
            FROM UNNEST($1::BIGINT[], $2::VARCHAR[], $3::TEXT[]) AS t(passenger_id, email, content)
            RETURNING id, passenger_id, email, content, created_at
            "#,
        )
        .bind(passenger_ids)
        .bind(emails)
        .bind(contents)
        .fetch_all(&mut *tx)
        .await
        .map_err(repository_error)?;
        commit(tx).await?;

        let mut notifications = rows
            .into_iter()
            .map(Notification::try_from)
            .collect::<DomainResult<Vec<_>>>()?;
        notifications.sort_by_key(|n| n.id.0);
        Ok(notifications)
    }

    /// すべての通知を削除する。
    async fn delete_all(&self) -> DomainResult<u64> {
        let mut tx = self.begin().await?;
        let result = sqlx::query("DELETE FROM notifications")
            .execute(&mut *tx)
            .await
            .map_err(repository_error)?;
        commit(tx).await?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct NotificationRow {
    id: i64,
    passenger_id: i64,
    email: String,
    content: String,
    created_at: OffsetDateTime,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = DomainError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Notification {
            id: row.id.into(),
            content: row.content.try_into()?,
            email: row.email.try_into()?,
            passenger_id: row.passenger_id.into(),
            created_at: row.created_at,
        })
    }
}

/// 乗客が所有する通知を取得する。
pub(super) async fn notifications_of(
    conn: &mut PgConnection,
    passenger_ids: Vec<i64>,
) -> DomainResult<Vec<Notification>> {
    if passenger_ids.is_empty() {
        return Ok(vec![]);
    }
    sqlx::query_as::<_, NotificationRow>(
        r#"
        SELECT id, passenger_id, email, content, created_at
        FROM notifications
        WHERE passenger_id = ANY($1)
        ORDER BY created_at, id
        "#,
    )
    .bind(passenger_ids)
    .fetch_all(conn)
    .await
    .map_err(repository_error)?
    .into_iter()
    .map(Notification::try_from)
    .collect()
}

fn insert_error(e: sqlx::Error, passenger_id: PassengerId) -> DomainError {
    if is_foreign_key_violation(&e) {
        domain_error(
            DomainErrorKind::NotFound,
            format!("Passenger with id {} not found", passenger_id),
        )
    } else {
        repository_error(e)
    }
}
