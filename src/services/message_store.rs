use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::events::{self, StoreEvent};
use crate::ids;
use crate::models::Message;
use crate::services::history::HistoryTracker;

const MESSAGE_COLUMNS: &str =
    "id, sender_id, receiver_id, content, created_at, read, edited, edited_by, parent_id";

pub struct MessageStore;

impl MessageStore {
    /// Create a message and, in the same transaction, its delivery
    /// notification (suppressed for self-addressed messages).
    pub async fn create(
        db: &Pool<Postgres>,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: &str,
        parent_id: Option<Uuid>,
    ) -> AppResult<Message> {
        let mut tx = db.begin().await?;

        Self::require_user(&mut tx, "sender", sender_id).await?;
        Self::require_user(&mut tx, "receiver", receiver_id).await?;
        if let Some(parent) = parent_id {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM messages WHERE id = $1)")
                    .bind(parent)
                    .fetch_one(&mut *tx)
                    .await?;
            if !exists {
                return Err(AppError::InvalidReference {
                    entity: "parent",
                    id: parent,
                });
            }
        }

        let message = sqlx::query_as::<_, Message>(&format!(
            "INSERT INTO messages (id, sender_id, receiver_id, content, parent_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(ids::new_id())
        .bind(sender_id)
        .bind(receiver_id)
        .bind(content)
        .bind(parent_id)
        .fetch_one(&mut *tx)
        .await?;

        events::dispatch(
            &mut tx,
            &StoreEvent::MessageCreated {
                message_id: message.id,
                sender_id,
                receiver_id,
                created_at: message.created_at,
            },
        )
        .await?;

        tx.commit().await?;
        tracing::info!(message_id = %message.id, sender_id = %sender_id, receiver_id = %receiver_id, reply = parent_id.is_some(), "message created");
        Ok(message)
    }

    /// Edit a message's content. A no-op when the content is unchanged.
    /// Otherwise the pre-edit content is snapshotted into the history in the
    /// same transaction. The row lock serializes concurrent edits; the last
    /// committed write wins and each committed edit snapshots exactly the
    /// content it replaced.
    pub async fn edit(
        db: &Pool<Postgres>,
        message_id: Uuid,
        editor: Option<Uuid>,
        new_content: &str,
    ) -> AppResult<Message> {
        let mut tx = db.begin().await?;

        let current = sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1 FOR UPDATE"
        ))
        .bind(message_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound(message_id))?;

        if current.content == new_content {
            // Unchanged content: no history entry, edited flag untouched.
            return Ok(current);
        }

        if let Some(editor_id) = editor {
            Self::require_user(&mut tx, "editor", editor_id).await?;
        }
        let editor_id = HistoryTracker::resolve_editor(editor, current.sender_id);

        let updated = sqlx::query_as::<_, Message>(&format!(
            "UPDATE messages SET content = $1, edited = true, edited_by = $2 \
             WHERE id = $3 \
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(new_content)
        .bind(editor_id)
        .bind(message_id)
        .fetch_one(&mut *tx)
        .await?;

        events::dispatch(
            &mut tx,
            &StoreEvent::MessageEdited {
                message_id,
                editor_id,
                old_content: current.content,
                edited_at: chrono::Utc::now(),
            },
        )
        .await?;

        tx.commit().await?;
        tracing::info!(message_id = %message_id, editor_id = %editor_id, "message edited");
        Ok(updated)
    }

    /// Mark a single message read. Only the receiver may do this.
    pub async fn mark_read(
        db: &Pool<Postgres>,
        message_id: Uuid,
        requester: Uuid,
    ) -> AppResult<()> {
        let receiver_id: Option<Uuid> =
            sqlx::query_scalar("SELECT receiver_id FROM messages WHERE id = $1")
                .bind(message_id)
                .fetch_optional(db)
                .await?;

        match receiver_id {
            None => Err(AppError::NotFound(message_id)),
            Some(r) if r != requester => Err(AppError::PermissionDenied),
            Some(_) => {
                sqlx::query("UPDATE messages SET read = true WHERE id = $1")
                    .bind(message_id)
                    .execute(db)
                    .await?;
                Ok(())
            }
        }
    }

    /// Delete a message and everything derived from it: all transitive
    /// replies, their notifications, and their edit histories, in one
    /// transaction.
    pub async fn delete(db: &Pool<Postgres>, message_id: Uuid) -> AppResult<()> {
        let mut tx = db.begin().await?;

        let thread_ids: Vec<Uuid> = sqlx::query_scalar(
            "WITH RECURSIVE thread AS ( \
                 SELECT id FROM messages WHERE id = $1 \
                 UNION \
                 SELECT m.id FROM messages m JOIN thread t ON m.parent_id = t.id \
             ) \
             SELECT id FROM thread",
        )
        .bind(message_id)
        .fetch_all(&mut *tx)
        .await?;

        if thread_ids.is_empty() {
            return Err(AppError::NotFound(message_id));
        }

        let notifications = sqlx::query("DELETE FROM notifications WHERE message_id = ANY($1)")
            .bind(&thread_ids)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let histories = sqlx::query("DELETE FROM message_history WHERE message_id = ANY($1)")
            .bind(&thread_ids)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let messages = sqlx::query("DELETE FROM messages WHERE id = ANY($1)")
            .bind(&thread_ids)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        tracing::info!(
            message_id = %message_id,
            messages,
            notifications,
            histories,
            "message deleted with thread and derived records"
        );
        Ok(())
    }

    /// Root message followed by all direct and transitive replies, in
    /// creation order.
    pub async fn get_thread(db: &Pool<Postgres>, message_id: Uuid) -> AppResult<Vec<Message>> {
        let rows = sqlx::query_as::<_, Message>(&format!(
            "WITH RECURSIVE thread AS ( \
                 SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1 \
                 UNION ALL \
                 SELECT m.id, m.sender_id, m.receiver_id, m.content, m.created_at, m.read, \
                        m.edited, m.edited_by, m.parent_id \
                 FROM messages m JOIN thread t ON m.parent_id = t.id \
             ) \
             SELECT {MESSAGE_COLUMNS} FROM thread ORDER BY created_at ASC, id ASC"
        ))
        .bind(message_id)
        .fetch_all(db)
        .await?;

        if rows.is_empty() {
            return Err(AppError::NotFound(message_id));
        }
        Ok(rows)
    }

    /// All messages exchanged between two users, either direction, oldest
    /// first.
    pub async fn conversation(
        db: &Pool<Postgres>,
        a: Uuid,
        b: Uuid,
    ) -> AppResult<Vec<Message>> {
        let rows = sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages \
             WHERE (sender_id = $1 AND receiver_id = $2) \
                OR (sender_id = $2 AND receiver_id = $1) \
             ORDER BY created_at ASC, id ASC"
        ))
        .bind(a)
        .bind(b)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    async fn require_user(
        tx: &mut Transaction<'_, Postgres>,
        entity: &'static str,
        id: Uuid,
    ) -> AppResult<()> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut **tx)
            .await?;
        if exists {
            Ok(())
        } else {
            Err(AppError::InvalidReference { entity, id })
        }
    }
}
