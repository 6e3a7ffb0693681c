use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only snapshot of a message's content as it existed immediately
/// before an edit. One row per content-changing edit.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MessageHistory {
    pub id: Uuid,
    pub message_id: Uuid,
    pub old_content: String,
    pub edited_by: Option<Uuid>,
    pub edited_at: DateTime<Utc>,
}
