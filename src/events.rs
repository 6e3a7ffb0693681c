//! Typed store events and their synchronous, in-transaction dispatch.
//!
//! Every mutating operation on the message store produces a `StoreEvent`
//! value and hands it to `dispatch` before committing. Reactors therefore
//! run inside the same transaction as the primary mutation: if a derived
//! record cannot be written, the whole mutation rolls back. There is no
//! ambient "current user" lookup; everything a reactor needs is carried on
//! the event itself.

use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::{history::HistoryTracker, notifications::NotificationGenerator};

#[derive(Debug, Clone)]
pub enum StoreEvent {
    MessageCreated {
        message_id: Uuid,
        sender_id: Uuid,
        receiver_id: Uuid,
        created_at: DateTime<Utc>,
    },
    MessageEdited {
        message_id: Uuid,
        /// Resolved editor: the explicit caller identity, or the original
        /// sender when none was supplied.
        editor_id: Uuid,
        old_content: String,
        edited_at: DateTime<Utc>,
    },
}

impl StoreEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            StoreEvent::MessageCreated { .. } => "message-created",
            StoreEvent::MessageEdited { .. } => "message-edited",
        }
    }
}

/// Route an event to its reactors within the caller's transaction.
pub async fn dispatch(tx: &mut Transaction<'_, Postgres>, event: &StoreEvent) -> AppResult<()> {
    match event {
        StoreEvent::MessageCreated {
            message_id,
            sender_id,
            receiver_id,
            created_at,
        } => {
            NotificationGenerator::on_message_created(
                tx,
                *message_id,
                *sender_id,
                *receiver_id,
                *created_at,
            )
            .await
        }
        StoreEvent::MessageEdited {
            message_id,
            editor_id,
            old_content,
            edited_at,
        } => {
            HistoryTracker::on_message_edited(tx, *message_id, *editor_id, old_content, *edited_at)
                .await
        }
    }
}
