use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
    pub edited: bool,
    pub edited_by: Option<Uuid>,
    /// Set on replies; threads are the transitive closure of this link.
    pub parent_id: Option<Uuid>,
}

/// Minimal projection served by the unread index. Content and sender are
/// enough to render an inbox row without pulling full message rows.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UnreadMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
