//! Notification domain module.
//!
//! # Module Structure
//!
//! - `model`: The notification record and its shape check (`NotificationRecord`)
//! - `store`: The deduplicated, ordered local inbox (`NotificationStore`, `InboxSnapshot`)

mod model;
mod store;

// Re-export public API
pub use model::NotificationRecord;
pub use store::{InboxSnapshot, NotificationStore, Records};
