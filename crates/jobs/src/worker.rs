use skillswap_config::JobsConfig;
use skillswap_database::{Exchange, NewNotification, RecordingStatus, Repositories};
use skillswap_realtime::{
    ExchangeId, FanoutEvent, FanoutGateway, SkillVerified, TranscriptReady, UserId,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{Job, JobError};

/// Completed-exchange counts that unlock an achievement, by catalogue criteria.
pub const ACHIEVEMENT_MILESTONES: &[(i64, &str)] = &[
    (1, "FIRST_EXCHANGE"),
    (5, "FIVE_EXCHANGES"),
    (10, "TEN_EXCHANGES"),
];

/// Executes jobs one at a time against the database, then notifies users.
#[derive(Clone)]
pub struct JobWorker {
    repos: Repositories,
    fanout: FanoutGateway,
    config: JobsConfig,
}

impl JobWorker {
    pub fn new(repos: Repositories, fanout: FanoutGateway, config: JobsConfig) -> Self {
        Self {
            repos,
            fanout,
            config,
        }
    }

    /// Drain `receiver` until every sender is gone.
    pub async fn run(&self, mut receiver: mpsc::Receiver<Job>) {
        while let Some(job) = receiver.recv().await {
            self.process(job).await;
        }
    }

    /// Run one job, logging rather than returning its failure.
    pub async fn process(&self, job: Job) {
        let kind = job.kind();
        match self.handle(job).await {
            Ok(()) => debug!(job = kind, "job finished"),
            Err(err) => warn!(job = kind, error = %err, "job failed"),
        }
    }

    pub async fn handle(&self, job: Job) -> Result<(), JobError> {
        match job {
            Job::ExchangeCompleted { user_id } => self.check_exchange_achievements(&user_id).await,
            Job::SkillReviewed { user_id, topic_id } => {
                self.check_skill_verification(&user_id, &topic_id).await
            }
            Job::TranscriptionFinished {
                recording_id,
                transcript,
            } => self.finish_transcription(&recording_id, &transcript).await,
            Job::ReviewSummaryReady {
                user_id,
                positive,
                negative,
            } => self.store_review_summary(&user_id, &positive, &negative).await,
            Job::CreateNotification {
                user_id,
                message,
                link,
            } => self.create_notification(user_id, message, link).await,
        }
    }

    async fn check_exchange_achievements(&self, user_id: &UserId) -> Result<(), JobError> {
        let completed = self.repos.exchanges.count_completed_for(user_id).await?;

        for &(threshold, criteria) in ACHIEVEMENT_MILESTONES {
            if completed >= threshold {
                self.award(user_id, criteria).await?;
            }
        }
        Ok(())
    }

    async fn award(&self, user_id: &UserId, criteria: &str) -> Result<(), JobError> {
        let Some(achievement) = self.repos.achievements.find_by_criteria(criteria).await? else {
            warn!(criteria, "achievement missing from catalogue");
            return Ok(());
        };

        if !self.repos.achievements.award(user_id, &achievement).await? {
            return Ok(());
        }

        info!(user_id = %user_id, achievement = %achievement.name, "achievement unlocked");
        self.fanout
            .notify(
                user_id,
                FanoutEvent::AchievementUnlocked(achievement.unlocked_event()),
            )
            .await;
        Ok(())
    }

    async fn check_skill_verification(&self, user_id: &UserId, topic_id: &str) -> Result<(), JobError> {
        if self.repos.skills.is_verified(user_id, topic_id).await? {
            return Ok(());
        }

        let ratings = self.repos.exchanges.teaching_ratings(user_id, topic_id).await?;
        if ratings.len() < self.config.min_exchanges_for_verification {
            debug!(user_id = %user_id, topic_id, rated = ratings.len(), "not enough rated exchanges");
            return Ok(());
        }

        let average = ratings.iter().sum::<i64>() as f64 / ratings.len() as f64;
        if average < self.config.min_rating_for_verification {
            debug!(user_id = %user_id, topic_id, average, "average rating below threshold");
            return Ok(());
        }

        let topic = self
            .repos
            .skills
            .find_topic(topic_id)
            .await?
            .ok_or(JobError::NotFound("topic"))?;

        if self.repos.skills.mark_verified(user_id, topic_id).await? {
            self.fanout
                .notify(
                    user_id,
                    FanoutEvent::SkillVerified(SkillVerified {
                        topic_name: topic.name,
                    }),
                )
                .await;
        }
        Ok(())
    }

    async fn finish_transcription(&self, recording_id: &str, transcript: &str) -> Result<(), JobError> {
        let recording = match self.repos.recordings.find_by_id(recording_id).await? {
            Some(recording) if recording.status == RecordingStatus::Processing => recording,
            Some(_) => {
                debug!(recording_id, "recording already finished");
                return Ok(());
            }
            None => {
                debug!(recording_id, "recording not found");
                return Ok(());
            }
        };

        if transcript.trim().is_empty() {
            self.repos.recordings.mark_failed(recording_id).await?;
            warn!(recording_id, "empty transcript, recording marked failed");
            return Ok(());
        }

        if !self.repos.recordings.complete(recording_id, transcript).await? {
            return Ok(());
        }

        let exchange = self.find_exchange(&recording.exchange).await?;
        let event = FanoutEvent::TranscriptReady(TranscriptReady {
            recording_id: recording.id,
            title: format!("Recording from {}", recording.created_at.format("%-m/%-d/%Y")),
        });
        self.fanout
            .notify_many([&exchange.initiator, &exchange.receiver], event)
            .await;
        Ok(())
    }

    async fn find_exchange(&self, id: &ExchangeId) -> Result<Exchange, JobError> {
        self.repos
            .exchanges
            .find_by_id(id)
            .await?
            .ok_or(JobError::NotFound("exchange"))
    }

    async fn store_review_summary(
        &self,
        user_id: &UserId,
        positive: &str,
        negative: &str,
    ) -> Result<(), JobError> {
        let reviews = self.repos.exchanges.reviews_about(user_id).await?;
        if reviews.len() < self.config.min_reviews_for_summary {
            debug!(user_id = %user_id, reviews = reviews.len(), "not enough reviews to summarise");
            return Ok(());
        }

        self.repos
            .users
            .set_review_summary(user_id, positive, negative)
            .await?;
        info!(user_id = %user_id, reviews = reviews.len(), "review summary updated");
        self.fanout
            .notify(user_id, FanoutEvent::ReviewSummaryUpdated)
            .await;
        Ok(())
    }

    async fn create_notification(
        &self,
        user_id: UserId,
        message: String,
        link: String,
    ) -> Result<(), JobError> {
        let notification = self
            .repos
            .notifications
            .create(&NewNotification {
                user: user_id.clone(),
                message,
                link,
            })
            .await?;

        self.fanout
            .notify(&user_id, FanoutEvent::NewNotification(notification))
            .await;
        Ok(())
    }
}
