//! Database repository implementations

pub mod achievement_repository;
pub mod exchange_repository;
pub mod message_repository;
pub mod notification_repository;
pub mod recording_repository;
pub mod skill_repository;
pub mod user_repository;

pub use achievement_repository::*;
pub use exchange_repository::*;
pub use message_repository::*;
pub use notification_repository::*;
pub use recording_repository::*;
pub use skill_repository::*;
pub use user_repository::*;

use chrono::{DateTime, Utc};
use skillswap_realtime::{ExchangeId, UserId};
use sqlx::{sqlite::SqliteRow, Row};

use crate::types::{parse_timestamp, DatabaseError, DatabaseResult};

pub(crate) fn user_id_column(row: &SqliteRow, column: &str) -> DatabaseResult<UserId> {
    let raw: String = row.try_get(column)?;
    UserId::parse(&raw).map_err(|_| DatabaseError::InvalidData(format!("{column} {raw:?}")))
}

pub(crate) fn exchange_id_column(row: &SqliteRow, column: &str) -> DatabaseResult<ExchangeId> {
    let raw: String = row.try_get(column)?;
    ExchangeId::parse(&raw).map_err(|_| DatabaseError::InvalidData(format!("{column} {raw:?}")))
}

pub(crate) fn timestamp_column(row: &SqliteRow, column: &str) -> DatabaseResult<DateTime<Utc>> {
    let raw: String = row.try_get(column)?;
    parse_timestamp(&raw)
}
