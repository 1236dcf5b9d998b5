use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::worker::JobWorker;
use crate::Job;

/// Producer side of the job queue. Cloning is cheap.
#[derive(Clone)]
pub struct JobQueue {
    sender: mpsc::Sender<Job>,
}

impl JobQueue {
    /// A queue holding at most `capacity` pending jobs, and its receiving end.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Job>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Enqueue without waiting. Returns `false` when the job was dropped.
    pub fn submit(&self, job: Job) -> bool {
        match self.sender.try_send(job) {
            Ok(()) => true,
            Err(TrySendError::Full(job)) => {
                warn!(job = job.kind(), "job queue full, dropping job");
                false
            }
            Err(TrySendError::Closed(job)) => {
                warn!(job = job.kind(), "job worker stopped, dropping job");
                false
            }
        }
    }
}

/// Start `worker` on its own task. The task ends once every queue clone is dropped.
pub fn spawn_worker(worker: JobWorker, capacity: usize) -> (JobQueue, JoinHandle<()>) {
    let (queue, receiver) = JobQueue::channel(capacity);
    let handle = tokio::spawn(async move {
        info!(capacity, "job worker started");
        worker.run(receiver).await;
        info!("job worker stopped");
    });
    (queue, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillswap_realtime::UserId;

    fn job() -> Job {
        Job::ExchangeCompleted {
            user_id: UserId::parse("u1").unwrap(),
        }
    }

    #[tokio::test]
    async fn submit_drops_when_full() {
        let (queue, mut receiver) = JobQueue::channel(1);

        assert!(queue.submit(job()));
        assert!(!queue.submit(job()));

        assert_eq!(receiver.recv().await, Some(job()));
        assert!(queue.submit(job()));
    }

    #[tokio::test]
    async fn submit_after_receiver_closed_is_a_no_op() {
        let (queue, receiver) = JobQueue::channel(4);
        drop(receiver);

        assert!(!queue.submit(job()));
    }
}
