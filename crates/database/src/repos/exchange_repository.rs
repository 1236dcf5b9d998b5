//! Repository for exchange data access operations.

use async_trait::async_trait;
use chrono::Utc;
use skillswap_realtime::{
    ExchangeId, ExchangeRecord, ExchangeStatus, ExchangeStore, StoreError, UserId,
};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::info;

use super::{exchange_id_column, timestamp_column, user_id_column};
use crate::entities::{Exchange, NewExchange, ReviewSide};
use crate::types::{timestamp, DatabaseError, DatabaseResult};

const EXCHANGE_COLUMNS: &str = "id, initiator_id, receiver_id, topic_to_learn_id, topic_to_teach_id, \
     status, initiator_rating, initiator_review, receiver_rating, receiver_review, created_at, updated_at";

/// Repository for exchange database operations
#[derive(Clone)]
pub struct ExchangeRepository {
    pool: SqlitePool,
}

impl ExchangeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: &NewExchange) -> DatabaseResult<Exchange> {
        let id = cuid2::cuid();
        let now = timestamp(Utc::now());

        sqlx::query(
            "INSERT INTO exchanges (id, initiator_id, receiver_id, topic_to_learn_id, topic_to_teach_id, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(request.initiator.as_str())
        .bind(request.receiver.as_str())
        .bind(&request.topic_to_learn)
        .bind(&request.topic_to_teach)
        .bind(request.status.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        info!(
            exchange_id = %id,
            initiator = %request.initiator,
            receiver = %request.receiver,
            "created exchange"
        );

        let exchange_id = ExchangeId::parse(&id)
            .map_err(|_| DatabaseError::InvalidData(format!("generated id {id:?}")))?;
        self.find_by_id(&exchange_id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("exchange {id}")))
    }

    pub async fn find_by_id(&self, id: &ExchangeId) -> DatabaseResult<Option<Exchange>> {
        let row = sqlx::query(&format!("SELECT {EXCHANGE_COLUMNS} FROM exchanges WHERE id = ?"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| map_exchange(&row)).transpose()
    }

    pub async fn update_status(&self, id: &ExchangeId, status: ExchangeStatus) -> DatabaseResult<()> {
        let result = sqlx::query("UPDATE exchanges SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(timestamp(Utc::now()))
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("exchange {id}")));
        }
        info!(exchange_id = %id, status = %status, "updated exchange status");
        Ok(())
    }

    /// Record one participant's rating and review. Returns `false` when that
    /// participant has already reviewed the exchange.
    pub async fn record_review(
        &self,
        id: &ExchangeId,
        side: ReviewSide,
        rating: i64,
        review: Option<&str>,
    ) -> DatabaseResult<bool> {
        let sql = match side {
            ReviewSide::Initiator => {
                "UPDATE exchanges SET initiator_rating = ?, initiator_review = ?, updated_at = ?
                 WHERE id = ? AND initiator_rating IS NULL"
            }
            ReviewSide::Receiver => {
                "UPDATE exchanges SET receiver_rating = ?, receiver_review = ?, updated_at = ?
                 WHERE id = ? AND receiver_rating IS NULL"
            }
        };

        let result = sqlx::query(sql)
            .bind(rating)
            .bind(review)
            .bind(timestamp(Utc::now()))
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Completed exchanges the user took part in, on either side.
    pub async fn count_completed_for(&self, user: &UserId) -> DatabaseResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM exchanges
             WHERE status = 'completed' AND (initiator_id = ?1 OR receiver_id = ?1)",
        )
        .bind(user.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Ratings the user received for teaching `topic` in completed exchanges.
    ///
    /// An initiator teaches `topic_to_teach` and is rated by the receiver; a
    /// receiver teaches `topic_to_learn` and is rated by the initiator.
    pub async fn teaching_ratings(&self, user: &UserId, topic: &str) -> DatabaseResult<Vec<i64>> {
        let ratings = sqlx::query_scalar(
            "SELECT receiver_rating FROM exchanges
             WHERE status = 'completed' AND initiator_id = ?1 AND topic_to_teach_id = ?2
               AND receiver_rating IS NOT NULL
             UNION ALL
             SELECT initiator_rating FROM exchanges
             WHERE status = 'completed' AND receiver_id = ?1 AND topic_to_learn_id = ?2
               AND initiator_rating IS NOT NULL",
        )
        .bind(user.as_str())
        .bind(topic)
        .fetch_all(&self.pool)
        .await?;

        Ok(ratings)
    }

    /// Written reviews other participants left about the user.
    pub async fn reviews_about(&self, user: &UserId) -> DatabaseResult<Vec<String>> {
        let reviews = sqlx::query_scalar(
            "SELECT initiator_review FROM exchanges
             WHERE status = 'completed' AND receiver_id = ?1
               AND initiator_review IS NOT NULL AND initiator_review != ''
             UNION ALL
             SELECT receiver_review FROM exchanges
             WHERE status = 'completed' AND initiator_id = ?1
               AND receiver_review IS NOT NULL AND receiver_review != ''",
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }
}

fn map_exchange(row: &SqliteRow) -> DatabaseResult<Exchange> {
    let status: String = row.try_get("status")?;

    Ok(Exchange {
        id: exchange_id_column(row, "id")?,
        initiator: user_id_column(row, "initiator_id")?,
        receiver: user_id_column(row, "receiver_id")?,
        topic_to_learn: row.try_get("topic_to_learn_id")?,
        topic_to_teach: row.try_get("topic_to_teach_id")?,
        status: ExchangeStatus::from(status.as_str()),
        initiator_rating: row.try_get("initiator_rating")?,
        initiator_review: row.try_get("initiator_review")?,
        receiver_rating: row.try_get("receiver_rating")?,
        receiver_review: row.try_get("receiver_review")?,
        created_at: timestamp_column(row, "created_at")?,
        updated_at: timestamp_column(row, "updated_at")?,
    })
}

#[async_trait]
impl ExchangeStore for ExchangeRepository {
    async fn find_exchange(&self, id: &ExchangeId) -> Result<Option<ExchangeRecord>, StoreError> {
        Ok(self.find_by_id(id).await?.map(|exchange| exchange.record()))
    }
}
