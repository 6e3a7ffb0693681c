use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::ids;
use crate::models::Notification;

pub struct NotificationGenerator;

impl NotificationGenerator {
    /// Reactor for message-created events. Runs inside the creating
    /// transaction: a committed message either has its notification or was
    /// self-addressed.
    pub async fn on_message_created(
        tx: &mut Transaction<'_, Postgres>,
        message_id: Uuid,
        sender_id: Uuid,
        receiver_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> AppResult<()> {
        if sender_id == receiver_id {
            tracing::debug!(message_id = %message_id, "self-addressed message, notification suppressed");
            return Ok(());
        }

        sqlx::query(
            "INSERT INTO notifications (id, user_id, message_id, created_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(ids::new_id())
        .bind(receiver_id)
        .bind(message_id)
        .bind(created_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// All notifications owned by a user, newest first.
    pub async fn notifications_for(
        db: &Pool<Postgres>,
        user_id: Uuid,
    ) -> AppResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, Notification>(
            "SELECT id, user_id, message_id, created_at, read \
             FROM notifications WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Mark one notification read. Only its owner may do this.
    pub async fn mark_notification_read(
        db: &Pool<Postgres>,
        notification_id: Uuid,
        requester: Uuid,
    ) -> AppResult<()> {
        let owner: Option<Uuid> =
            sqlx::query_scalar("SELECT user_id FROM notifications WHERE id = $1")
                .bind(notification_id)
                .fetch_optional(db)
                .await?;

        match owner {
            None => Err(AppError::NotFound(notification_id)),
            Some(o) if o != requester => Err(AppError::PermissionDenied),
            Some(_) => {
                sqlx::query("UPDATE notifications SET read = true WHERE id = $1")
                    .bind(notification_id)
                    .execute(db)
                    .await?;
                Ok(())
            }
        }
    }
}
