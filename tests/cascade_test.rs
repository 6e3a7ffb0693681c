//! User-removal cascade: one transaction that leaves no record referencing
//! the removed user and no orphaned derived rows.
//!
//! Requires a Postgres database via DATABASE_URL.
//! Run with: cargo test --test cascade_test -- --ignored

mod common;

use messaging_core::services::{CascadeCleaner, HistoryTracker, MessageStore};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

async fn count_scalar(pool: &Pool<Postgres>, sql: &str, id: Uuid) -> i64 {
    sqlx::query_scalar(sql)
        .bind(id)
        .fetch_one(pool)
        .await
        .expect("count query failed")
}

#[tokio::test]
#[ignore]
async fn user_removal_purges_all_dependent_records() {
    let pool = common::setup_pool().await;
    let u1 = common::create_user(&pool).await;
    let u2 = common::create_user(&pool).await;
    let u3 = common::create_user(&pool).await;

    // u1 <-> u2 traffic with an edit, plus a reply from u3 on u1's thread.
    let root = MessageStore::create(&pool, u1, u2, "root", None)
        .await
        .expect("create failed");
    MessageStore::edit(&pool, root.id, Some(u1), "root v2")
        .await
        .expect("edit failed");
    MessageStore::create(&pool, u3, u1, "reply", Some(root.id))
        .await
        .expect("create failed");
    // Unrelated traffic between u2 and u3 that must survive.
    let survivor = MessageStore::create(&pool, u2, u3, "unrelated", None)
        .await
        .expect("create failed");

    let report = CascadeCleaner::on_user_removed(&pool, u1)
        .await
        .expect("cascade failed");
    assert_eq!(report.messages, 2);

    let as_party = count_scalar(
        &pool,
        "SELECT COUNT(*)::bigint FROM messages WHERE sender_id = $1 OR receiver_id = $1",
        u1,
    )
    .await;
    assert_eq!(as_party, 0);
    let owned_notifications = count_scalar(
        &pool,
        "SELECT COUNT(*)::bigint FROM notifications WHERE user_id = $1",
        u1,
    )
    .await;
    assert_eq!(owned_notifications, 0);
    let edited_histories = count_scalar(
        &pool,
        "SELECT COUNT(*)::bigint FROM message_history WHERE edited_by = $1",
        u1,
    )
    .await;
    assert_eq!(edited_histories, 0);

    // No history row may reference a missing message.
    let orphans: i64 = sqlx::query_scalar(
        "SELECT COUNT(*)::bigint FROM message_history h \
         WHERE NOT EXISTS (SELECT 1 FROM messages m WHERE m.id = h.message_id)",
    )
    .fetch_one(&pool)
    .await
    .expect("orphan query failed");
    assert_eq!(orphans, 0);

    assert!(common::message_exists(&pool, survivor.id).await);
    assert_eq!(common::notification_count_for_message(&pool, survivor.id).await, 1);
}

#[tokio::test]
#[ignore]
async fn user_removal_is_idempotent() {
    let pool = common::setup_pool().await;
    let u1 = common::create_user(&pool).await;
    let u2 = common::create_user(&pool).await;

    MessageStore::create(&pool, u1, u2, "hi", None)
        .await
        .expect("create failed");

    let first = CascadeCleaner::on_user_removed(&pool, u1)
        .await
        .expect("first cascade failed");
    assert!(first.messages > 0);

    let second = CascadeCleaner::on_user_removed(&pool, u1)
        .await
        .expect("second cascade failed");
    assert_eq!(second.messages, 0);
    assert_eq!(second.notifications, 0);
    assert_eq!(second.histories, 0);
    assert_eq!(second.orphan_histories, 0);
}

#[tokio::test]
#[ignore]
async fn third_party_edit_history_is_removed_with_its_editor() {
    let pool = common::setup_pool().await;
    let u1 = common::create_user(&pool).await;
    let u2 = common::create_user(&pool).await;
    let editor = common::create_user(&pool).await;

    let msg = MessageStore::create(&pool, u1, u2, "original", None)
        .await
        .expect("create failed");
    MessageStore::edit(&pool, msg.id, Some(editor), "moderated")
        .await
        .expect("edit failed");

    CascadeCleaner::on_user_removed(&pool, editor)
        .await
        .expect("cascade failed");

    // The message itself survives, its third-party edit record does not.
    assert!(common::message_exists(&pool, msg.id).await);
    let history = HistoryTracker::get_history(&pool, msg.id)
        .await
        .expect("get_history failed");
    assert!(history.is_empty());
}

#[tokio::test]
#[ignore]
async fn scenario_full_lifecycle() {
    // The end-to-end flow: create, notify, edit, no-op edit, thread, cascade.
    let pool = common::setup_pool().await;
    let u1 = common::create_user(&pool).await;
    let u2 = common::create_user(&pool).await;

    let a = MessageStore::create(&pool, u1, u2, "hi", None)
        .await
        .expect("create A failed");
    assert_eq!(common::notification_count_for_message(&pool, a.id).await, 1);

    MessageStore::edit(&pool, a.id, Some(u1), "hello")
        .await
        .expect("edit failed");
    let history = HistoryTracker::get_history(&pool, a.id)
        .await
        .expect("get_history failed");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].old_content, "hi");

    MessageStore::edit(&pool, a.id, Some(u1), "hello")
        .await
        .expect("no-op edit failed");
    assert_eq!(common::history_count_for_message(&pool, a.id).await, 1);

    let b = MessageStore::create(&pool, u2, u1, "hey", Some(a.id))
        .await
        .expect("create B failed");
    let thread = MessageStore::get_thread(&pool, a.id)
        .await
        .expect("get_thread failed");
    let ids: Vec<_> = thread.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![a.id, b.id]);

    CascadeCleaner::on_user_removed(&pool, u1)
        .await
        .expect("cascade failed");
    assert!(!common::message_exists(&pool, a.id).await);
    assert!(!common::message_exists(&pool, b.id).await);
    assert_eq!(common::notification_count_for_message(&pool, a.id).await, 0);
    assert_eq!(common::notification_count_for_message(&pool, b.id).await, 0);
    assert_eq!(common::history_count_for_message(&pool, a.id).await, 0);
}
