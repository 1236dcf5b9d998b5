//! SkillSwap Database Crate
//!
//! SQLite persistence for users, exchanges, chat messages, notifications and
//! the records background jobs award. Repositories for users, exchanges and
//! messages also implement the realtime core's store traits.

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;
pub mod types;

use skillswap_config::DatabaseConfig;
use sqlx::SqlitePool;

pub use connection::prepare_database;
pub use migrations::run_migrations;

pub use repos::{
    AchievementRepository, ExchangeRepository, MessageRepository, NotificationRepository,
    RecordingRepository, SkillRepository, UserRepository, DEFAULT_NOTIFICATION_LIMIT,
};

pub use entities::{
    Achievement, AchievementSeed, Exchange, NewExchange, NewNotification, NewUser, Notification,
    Recording, RecordingStatus, ReviewSide, ReviewSummary, Topic, User, VerifiedSkill,
    ACHIEVEMENT_CATALOGUE,
};

pub use types::{DatabaseError, DatabaseResult};

/// Open the database and apply migrations
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;

    Ok(pool)
}

/// Every repository over one pool.
#[derive(Clone)]
pub struct Repositories {
    pub users: UserRepository,
    pub exchanges: ExchangeRepository,
    pub messages: MessageRepository,
    pub notifications: NotificationRepository,
    pub achievements: AchievementRepository,
    pub skills: SkillRepository,
    pub recordings: RecordingRepository,
}

impl Repositories {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            exchanges: ExchangeRepository::new(pool.clone()),
            messages: MessageRepository::new(pool.clone()),
            notifications: NotificationRepository::new(pool.clone()),
            achievements: AchievementRepository::new(pool.clone()),
            skills: SkillRepository::new(pool.clone()),
            recordings: RecordingRepository::new(pool),
        }
    }
}
