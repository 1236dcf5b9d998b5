//! SkillSwap background jobs
//!
//! Producers submit a [`Job`] after committing their own change. One worker
//! task drains the queue, persists each job's outcome and then pushes the
//! matching event to the affected users through the fanout gateway.

mod error;
mod queue;
mod worker;

use skillswap_realtime::UserId;

pub use error::JobError;
pub use queue::{spawn_worker, JobQueue};
pub use worker::{JobWorker, ACHIEVEMENT_MILESTONES};

#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    /// Re-check exchange-count achievements after an exchange completed.
    ExchangeCompleted { user_id: UserId },
    /// Re-check skill verification after the user was rated for teaching a topic.
    SkillReviewed { user_id: UserId, topic_id: String },
    /// Transcript delivered by the transcription service.
    TranscriptionFinished {
        recording_id: String,
        transcript: String,
    },
    /// Review analysis delivered by the analysis service.
    ReviewSummaryReady {
        user_id: UserId,
        positive: String,
        negative: String,
    },
    CreateNotification {
        user_id: UserId,
        message: String,
        link: String,
    },
}

impl Job {
    /// Short name used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Job::ExchangeCompleted { .. } => "exchange_completed",
            Job::SkillReviewed { .. } => "skill_reviewed",
            Job::TranscriptionFinished { .. } => "transcription_finished",
            Job::ReviewSummaryReady { .. } => "review_summary_ready",
            Job::CreateNotification { .. } => "create_notification",
        }
    }
}
