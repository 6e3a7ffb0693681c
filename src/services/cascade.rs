use std::time::Instant;

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::metrics;

/// Counts of records removed by one cascade run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CascadeReport {
    pub messages: u64,
    pub notifications: u64,
    pub histories: u64,
    pub orphan_histories: u64,
}

pub struct CascadeCleaner;

impl CascadeCleaner {
    /// Purge every record that references a removed user, directly or
    /// transitively, in one transaction:
    ///
    /// 1. every message the user sent or received, plus all transitive
    ///    replies, with their notifications and edit histories;
    /// 2. notifications owned by the user;
    /// 3. history rows attributed to the user as editor;
    /// 4. orphan sweep: history rows whose message no longer exists.
    ///
    /// Idempotent: a second run for the same user deletes nothing.
    pub async fn on_user_removed(db: &Pool<Postgres>, user_id: Uuid) -> AppResult<CascadeReport> {
        let started = Instant::now();
        let result = Self::run(db, user_id).await;
        metrics::record_cascade_duration(started.elapsed());

        match result {
            Ok(report) => {
                metrics::record_cascade_run("success");
                metrics::record_cascade_deleted("message", report.messages);
                metrics::record_cascade_deleted("notification", report.notifications);
                metrics::record_cascade_deleted("message_history", report.histories);
                metrics::record_cascade_deleted("orphan_history", report.orphan_histories);
                tracing::info!(
                    user_id = %user_id,
                    messages = report.messages,
                    notifications = report.notifications,
                    histories = report.histories,
                    orphan_histories = report.orphan_histories,
                    "user cascade cleanup complete"
                );
                Ok(report)
            }
            Err(source) => {
                metrics::record_cascade_run("error");
                tracing::error!(user_id = %user_id, error = %source, "user cascade cleanup rolled back");
                Err(AppError::CascadeFailure { user_id, source })
            }
        }
    }

    async fn run(db: &Pool<Postgres>, user_id: Uuid) -> Result<CascadeReport, sqlx::Error> {
        let mut tx = db.begin().await?;
        let mut report = CascadeReport::default();

        // Step 1: the user's messages and every transitive reply. Replies
        // between unrelated users still go: their parent is disappearing.
        let doomed: Vec<Uuid> = sqlx::query_scalar(
            "WITH RECURSIVE doomed AS ( \
                 SELECT id FROM messages WHERE sender_id = $1 OR receiver_id = $1 \
                 UNION \
                 SELECT m.id FROM messages m JOIN doomed d ON m.parent_id = d.id \
             ) \
             SELECT id FROM doomed",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        if !doomed.is_empty() {
            report.notifications += sqlx::query("DELETE FROM notifications WHERE message_id = ANY($1)")
                .bind(&doomed)
                .execute(&mut *tx)
                .await?
                .rows_affected();
            report.histories += sqlx::query("DELETE FROM message_history WHERE message_id = ANY($1)")
                .bind(&doomed)
                .execute(&mut *tx)
                .await?
                .rows_affected();
            report.messages += sqlx::query("DELETE FROM messages WHERE id = ANY($1)")
                .bind(&doomed)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        // Step 2: notifications the user owns. Empty when step 1 was
        // complete, since every notification rides on a received message.
        report.notifications += sqlx::query("DELETE FROM notifications WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        // Step 3: edits the user made on other people's threads.
        report.histories += sqlx::query("DELETE FROM message_history WHERE edited_by = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        // Step 4: orphan sweep.
        report.orphan_histories += sqlx::query(
            "DELETE FROM message_history h \
             WHERE NOT EXISTS (SELECT 1 FROM messages m WHERE m.id = h.message_id)",
        )
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        Ok(report)
    }
}
