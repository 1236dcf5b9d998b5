//! Exchange session recordings.

use chrono::Utc;
use skillswap_realtime::ExchangeId;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::info;

use super::{exchange_id_column, timestamp_column};
use crate::entities::{Recording, RecordingStatus};
use crate::types::{timestamp, DatabaseError, DatabaseResult};

#[derive(Clone)]
pub struct RecordingRepository {
    pool: SqlitePool,
}

impl RecordingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, exchange: &ExchangeId, url: &str) -> DatabaseResult<Recording> {
        let id = cuid2::cuid();

        sqlx::query(
            "INSERT INTO recordings (id, exchange_id, url, status, transcript, created_at)
             VALUES (?, ?, ?, 'processing', '', ?)",
        )
        .bind(&id)
        .bind(exchange.as_str())
        .bind(url)
        .bind(timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        self.find_by_id(&id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("recording {id}")))
    }

    pub async fn find_by_id(&self, id: &str) -> DatabaseResult<Option<Recording>> {
        let row = sqlx::query(
            "SELECT id, exchange_id, url, status, transcript, created_at FROM recordings WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| map_recording(&row)).transpose()
    }

    /// Store the transcript of a recording still being processed.
    /// Returns `false` if the recording is missing or already finished.
    pub async fn complete(&self, id: &str, transcript: &str) -> DatabaseResult<bool> {
        let changed = self
            .finish(id, RecordingStatus::Completed, transcript)
            .await?;
        if changed {
            info!(recording_id = id, "transcription stored");
        }
        Ok(changed)
    }

    pub async fn mark_failed(&self, id: &str) -> DatabaseResult<bool> {
        self.finish(id, RecordingStatus::Failed, "").await
    }

    async fn finish(&self, id: &str, status: RecordingStatus, transcript: &str) -> DatabaseResult<bool> {
        let result = sqlx::query(
            "UPDATE recordings SET status = ?, transcript = ? WHERE id = ? AND status = 'processing'",
        )
        .bind(status.as_str())
        .bind(transcript)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

fn map_recording(row: &SqliteRow) -> DatabaseResult<Recording> {
    let status: String = row.try_get("status")?;

    Ok(Recording {
        id: row.try_get("id")?,
        exchange: exchange_id_column(row, "exchange_id")?,
        url: row.try_get("url")?,
        status: RecordingStatus::from(status.as_str()),
        transcript: row.try_get("transcript")?,
        created_at: timestamp_column(row, "created_at")?,
    })
}
