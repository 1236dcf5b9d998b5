//! Row types persisted by the repositories

pub mod achievement;
pub mod exchange;
pub mod notification;
pub mod recording;
pub mod topic;
pub mod user;

pub use achievement::{Achievement, AchievementSeed, ACHIEVEMENT_CATALOGUE};
pub use exchange::{Exchange, NewExchange, ReviewSide};
pub use notification::{NewNotification, Notification};
pub use recording::{Recording, RecordingStatus};
pub use topic::{Topic, VerifiedSkill};
pub use user::{NewUser, ReviewSummary, User};
