pub mod cascade;
pub mod history;
pub mod message_store;
pub mod notifications;
pub mod unread_index;

pub use cascade::CascadeCleaner;
pub use history::HistoryTracker;
pub use message_store::MessageStore;
pub use notifications::NotificationGenerator;
pub use unread_index::UnreadIndex;
