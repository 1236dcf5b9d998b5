//! Topics and verified skill badges.

use chrono::Utc;
use skillswap_realtime::UserId;
use sqlx::{Row, SqlitePool};
use tracing::info;

use super::{timestamp_column, user_id_column};
use crate::entities::{Topic, VerifiedSkill};
use crate::types::{timestamp, DatabaseResult};

#[derive(Clone)]
pub struct SkillRepository {
    pool: SqlitePool,
}

impl SkillRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a topic, or return the existing one with the same name.
    pub async fn upsert_topic(&self, name: &str) -> DatabaseResult<Topic> {
        sqlx::query("INSERT OR IGNORE INTO topics (id, name) VALUES (?, ?)")
            .bind(cuid2::cuid())
            .bind(name)
            .execute(&self.pool)
            .await?;

        let row = sqlx::query("SELECT id, name FROM topics WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;

        Ok(Topic {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
        })
    }

    pub async fn find_topic(&self, id: &str) -> DatabaseResult<Option<Topic>> {
        let row = sqlx::query("SELECT id, name FROM topics WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            Ok(Topic {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
            })
        })
        .transpose()
    }

    pub async fn is_verified(&self, user: &UserId, topic_id: &str) -> DatabaseResult<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM verified_skills WHERE user_id = ? AND topic_id = ?")
                .bind(user.as_str())
                .bind(topic_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(found.is_some())
    }

    /// Record a verified skill. Returns `false` when it was already recorded.
    pub async fn mark_verified(&self, user: &UserId, topic_id: &str) -> DatabaseResult<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO verified_skills (user_id, topic_id, verified_at) VALUES (?, ?, ?)",
        )
        .bind(user.as_str())
        .bind(topic_id)
        .bind(timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected() == 1;
        if inserted {
            info!(user_id = %user, topic_id, "verified skill");
        }
        Ok(inserted)
    }

    pub async fn verified_for(&self, user: &UserId) -> DatabaseResult<Vec<VerifiedSkill>> {
        let rows = sqlx::query(
            "SELECT user_id, topic_id, verified_at FROM verified_skills
             WHERE user_id = ? ORDER BY verified_at ASC",
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(VerifiedSkill {
                    user: user_id_column(row, "user_id")?,
                    topic: row.try_get("topic_id")?,
                    verified_at: timestamp_column(row, "verified_at")?,
                })
            })
            .collect()
    }
}
