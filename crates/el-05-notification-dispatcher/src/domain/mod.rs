//! Domain layer for the Notification Dispatcher

pub mod notification;
pub mod routing;

pub use notification::{Notification, NotificationKind};
pub use routing::notifications_for;
