//! Notification fan-out and the notification read model.

pub mod fanout;
pub mod feed;

pub use fanout::{kind_for_terminal, parse_kind, NotificationFanout, NotificationKind};
pub use feed::{NotificationFeed, NotificationRecord};
