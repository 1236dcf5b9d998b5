//! Notification entity

use skillswap_realtime::UserId;

/// Stored notifications share their shape with the `newNotification` payload.
pub use skillswap_realtime::NotificationView as Notification;

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user: UserId,
    pub message: String,
    /// Client route to open when the notification is clicked.
    pub link: String,
}
