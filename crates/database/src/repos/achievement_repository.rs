//! Achievement catalogue and awards.

use chrono::{DateTime, Utc};
use skillswap_realtime::UserId;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::info;

use super::timestamp_column;
use crate::entities::{Achievement, ACHIEVEMENT_CATALOGUE};
use crate::types::{timestamp, DatabaseResult};

#[derive(Clone)]
pub struct AchievementRepository {
    pool: SqlitePool,
}

impl AchievementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert catalogue entries that are not present yet. Existing entries,
    /// matched by criteria, are left untouched. Returns how many were added.
    pub async fn seed_catalogue(&self) -> DatabaseResult<u64> {
        let mut inserted = 0;
        for seed in ACHIEVEMENT_CATALOGUE {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO achievements (id, name, description, icon, criteria, points)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(cuid2::cuid())
            .bind(seed.name)
            .bind(seed.description)
            .bind(seed.icon)
            .bind(seed.criteria)
            .bind(seed.points)
            .execute(&self.pool)
            .await?;
            inserted += result.rows_affected();
        }

        info!(inserted, "seeded achievement catalogue");
        Ok(inserted)
    }

    pub async fn find_by_criteria(&self, criteria: &str) -> DatabaseResult<Option<Achievement>> {
        let row = sqlx::query(
            "SELECT id, name, description, icon, criteria, points FROM achievements WHERE criteria = ?",
        )
        .bind(criteria)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| map_achievement(&row)).transpose()
    }

    pub async fn has_achievement(&self, user: &UserId, achievement_id: &str) -> DatabaseResult<bool> {
        let held: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM user_achievements WHERE user_id = ? AND achievement_id = ?",
        )
        .bind(user.as_str())
        .bind(achievement_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(held.is_some())
    }

    /// Award `achievement` and credit its points in one transaction.
    ///
    /// Returns `false` without changing anything when the user already holds it.
    pub async fn award(&self, user: &UserId, achievement: &Achievement) -> DatabaseResult<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT OR IGNORE INTO user_achievements (user_id, achievement_id, awarded_at)
             VALUES (?, ?, ?)",
        )
        .bind(user.as_str())
        .bind(&achievement.id)
        .bind(timestamp(Utc::now()))
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("UPDATE users SET points = points + ? WHERE id = ?")
            .bind(achievement.points)
            .bind(user.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            user_id = %user,
            criteria = %achievement.criteria,
            points = achievement.points,
            "awarded achievement"
        );
        Ok(true)
    }

    /// Achievements held by a user, in the order they were awarded.
    pub async fn list_for_user(
        &self,
        user: &UserId,
    ) -> DatabaseResult<Vec<(Achievement, DateTime<Utc>)>> {
        let rows = sqlx::query(
            "SELECT a.id, a.name, a.description, a.icon, a.criteria, a.points, ua.awarded_at
             FROM user_achievements ua
             JOIN achievements a ON a.id = ua.achievement_id
             WHERE ua.user_id = ?
             ORDER BY ua.awarded_at ASC",
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Ok((map_achievement(row)?, timestamp_column(row, "awarded_at")?)))
            .collect()
    }
}

fn map_achievement(row: &SqliteRow) -> DatabaseResult<Achievement> {
    Ok(Achievement {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        icon: row.try_get("icon")?,
        criteria: row.try_get("criteria")?,
        points: row.try_get("points")?,
    })
}
