use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::ids;
use crate::models::MessageHistory;

pub struct HistoryTracker;

impl HistoryTracker {
    /// Attribution rule for history entries: the explicitly supplied editor,
    /// or the message's original sender when the calling context had no
    /// authenticated editor. Kept in one place so the fallback stays
    /// auditable.
    pub fn resolve_editor(explicit: Option<Uuid>, sender_id: Uuid) -> Uuid {
        explicit.unwrap_or(sender_id)
    }

    /// Reactor for message-edited events. Runs inside the editing
    /// transaction: the content update and its snapshot commit together or
    /// not at all.
    pub async fn on_message_edited(
        tx: &mut Transaction<'_, Postgres>,
        message_id: Uuid,
        editor_id: Uuid,
        old_content: &str,
        edited_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO message_history (id, message_id, old_content, edited_by, edited_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(ids::new_id())
        .bind(message_id)
        .bind(old_content)
        .bind(editor_id)
        .bind(edited_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Edit history for a message, most recent first.
    pub async fn get_history(
        db: &Pool<Postgres>,
        message_id: Uuid,
    ) -> AppResult<Vec<MessageHistory>> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM messages WHERE id = $1)")
                .bind(message_id)
                .fetch_one(db)
                .await?;
        if !exists {
            return Err(AppError::NotFound(message_id));
        }

        let rows = sqlx::query_as::<_, MessageHistory>(
            "SELECT id, message_id, old_content, edited_by, edited_at \
             FROM message_history WHERE message_id = $1 \
             ORDER BY edited_at DESC, id DESC",
        )
        .bind(message_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}
