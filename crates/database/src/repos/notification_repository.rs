//! Notification repository for database operations.

use chrono::Utc;
use skillswap_realtime::UserId;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::info;

use super::{timestamp_column, user_id_column};
use crate::entities::{NewNotification, Notification};
use crate::types::{timestamp, DatabaseResult};

/// Page size of the notification list.
pub const DEFAULT_NOTIFICATION_LIMIT: i64 = 20;

/// Repository for notification database operations
#[derive(Clone)]
pub struct NotificationRepository {
    pool: SqlitePool,
}

impl NotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: &NewNotification) -> DatabaseResult<Notification> {
        let id = cuid2::cuid();
        let created_at = Utc::now();

        sqlx::query(
            "INSERT INTO notifications (id, user_id, message, link, is_read, created_at)
             VALUES (?, ?, ?, ?, 0, ?)",
        )
        .bind(&id)
        .bind(request.user.as_str())
        .bind(&request.message)
        .bind(&request.link)
        .bind(timestamp(created_at))
        .execute(&self.pool)
        .await?;

        info!(notification_id = %id, user_id = %request.user, "created notification");

        Ok(Notification {
            id,
            user: request.user.clone(),
            message: request.message.clone(),
            link: request.link.clone(),
            is_read: false,
            created_at,
        })
    }

    /// Most recent notifications for a user, newest first.
    pub async fn latest_for(&self, user: &UserId, limit: i64) -> DatabaseResult<Vec<Notification>> {
        let rows = sqlx::query(
            "SELECT id, user_id, message, link, is_read, created_at FROM notifications
             WHERE user_id = ?
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?",
        )
        .bind(user.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_notification).collect()
    }

    /// Mark every unread notification of a user as read. Returns how many changed.
    pub async fn mark_all_read(&self, user: &UserId) -> DatabaseResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0",
        )
        .bind(user.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn unread_count(&self, user: &UserId) -> DatabaseResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0",
        )
        .bind(user.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

fn map_notification(row: &SqliteRow) -> DatabaseResult<Notification> {
    Ok(Notification {
        id: row.try_get("id")?,
        user: user_id_column(row, "user_id")?,
        message: row.try_get("message")?,
        link: row.try_get("link")?,
        is_read: row.try_get("is_read")?,
        created_at: timestamp_column(row, "created_at")?,
    })
}
