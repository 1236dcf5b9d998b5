//! User repository for database operations.

use async_trait::async_trait;
use chrono::Utc;
use skillswap_realtime::{StoreError, UserId, UserProfile, UserStore};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::info;

use super::{timestamp_column, user_id_column};
use crate::entities::{NewUser, ReviewSummary, User};
use crate::types::{timestamp, DatabaseError, DatabaseResult};

const USER_COLUMNS: &str = "id, full_name, username, email, avatar, points, review_positive, \
     review_negative, review_updated_at, created_at";

/// Repository for user database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: &NewUser) -> DatabaseResult<User> {
        let id = cuid2::cuid();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO users (id, full_name, username, email, avatar, points, created_at)
             VALUES (?, ?, ?, ?, ?, 0, ?)",
        )
        .bind(&id)
        .bind(&request.full_name)
        .bind(&request.username)
        .bind(&request.email)
        .bind(&request.avatar)
        .bind(timestamp(now))
        .execute(&self.pool)
        .await?;

        info!(user_id = %id, username = %request.username, "created user");

        let user_id = UserId::parse(&id)
            .map_err(|_| DatabaseError::InvalidData(format!("generated id {id:?}")))?;
        self.find_by_id(&user_id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("user {id}")))
    }

    pub async fn find_by_id(&self, id: &UserId) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| map_user(&row)).transpose()
    }

    pub async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| map_user(&row)).transpose()
    }

    pub async fn find_profile(&self, id: &UserId) -> DatabaseResult<Option<UserProfile>> {
        let row = sqlx::query("SELECT id, full_name, avatar FROM users WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            Ok(UserProfile {
                id: user_id_column(&row, "id")?,
                full_name: row.try_get("full_name")?,
                avatar: row.try_get("avatar")?,
            })
        })
        .transpose()
    }

    /// Store the latest review summary, replacing any previous one.
    pub async fn set_review_summary(
        &self,
        id: &UserId,
        positive: &str,
        negative: &str,
    ) -> DatabaseResult<()> {
        let result = sqlx::query(
            "UPDATE users SET review_positive = ?, review_negative = ?, review_updated_at = ?
             WHERE id = ?",
        )
        .bind(positive)
        .bind(negative)
        .bind(timestamp(Utc::now()))
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("user {id}")));
        }
        Ok(())
    }
}

fn map_user(row: &SqliteRow) -> DatabaseResult<User> {
    let positive: Option<String> = row.try_get("review_positive")?;
    let negative: Option<String> = row.try_get("review_negative")?;
    let updated_at: Option<String> = row.try_get("review_updated_at")?;

    let review_summary = match (positive, negative, updated_at) {
        (Some(positive), Some(negative), Some(_)) => Some(ReviewSummary {
            positive,
            negative,
            last_updated: timestamp_column(row, "review_updated_at")?,
        }),
        _ => None,
    };

    Ok(User {
        id: user_id_column(row, "id")?,
        full_name: row.try_get("full_name")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        avatar: row.try_get("avatar")?,
        points: row.try_get("points")?,
        review_summary,
        created_at: timestamp_column(row, "created_at")?,
    })
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_user(&self, id: &UserId) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.find_profile(id).await?)
    }
}
