use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::UnreadMessage;

/// Read-only derived view over unread messages. Never writes message rows
/// except through the single bulk update in `mark_all_read`.
pub struct UnreadIndex;

impl UnreadIndex {
    /// Unread messages addressed to a user, newest first, projected down to
    /// the fields an inbox needs.
    pub async fn unread_for(db: &Pool<Postgres>, user_id: Uuid) -> AppResult<Vec<UnreadMessage>> {
        let rows = sqlx::query_as::<_, UnreadMessage>(
            "SELECT id, sender_id, content, created_at \
             FROM messages WHERE receiver_id = $1 AND read = false \
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn unread_count(db: &Pool<Postgres>, user_id: Uuid) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*)::bigint FROM messages WHERE receiver_id = $1 AND read = false",
        )
        .bind(user_id)
        .fetch_one(db)
        .await?;
        Ok(count)
    }

    /// Mark every unread message addressed to a user as read in one bulk
    /// update. Returns the number of rows updated.
    pub async fn mark_all_read(db: &Pool<Postgres>, user_id: Uuid) -> AppResult<u64> {
        let updated = sqlx::query(
            "UPDATE messages SET read = true WHERE receiver_id = $1 AND read = false",
        )
        .bind(user_id)
        .execute(db)
        .await?
        .rows_affected();

        tracing::info!(user_id = %user_id, updated, "marked all unread messages read");
        Ok(updated)
    }
}
