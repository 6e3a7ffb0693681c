pub mod history;
pub mod message;
pub mod notification;

pub use history::MessageHistory;
pub use message::{Message, UnreadMessage};
pub use notification::Notification;
