//! In-memory fire-and-poll tracker for background generation.
//!
//! A submit spawns the generation future on the runtime and hands back a task
//! id plus the caller's position in the turn queue. There is no scheduler and
//! no backpressure; the tracker only records status and results, and prunes
//! finished entries after a retention window.

// Author: kelexine (https://github.com/kelexine)

use super::{TaskEntry, TaskState};
use crate::imagefx::reasons::ApiFailure;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct TaskQueue {
    retention_minutes: i64,
    tasks: RwLock<HashMap<Uuid, TaskEntry>>,
    /// Submission order of still-pending tasks; drives queue positions.
    pending: RwLock<VecDeque<Uuid>>,
}

impl TaskQueue {
    pub fn new(retention_minutes: i64) -> Self {
        Self {
            retention_minutes,
            tasks: RwLock::new(HashMap::new()),
            pending: RwLock::new(VecDeque::new()),
        }
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    /// Register a task and spawn its generation future. Returns the task id
    /// and how many submissions are queued ahead of it.
    pub async fn submit<F>(
        self: &Arc<Self>,
        session_id: String,
        save_images: bool,
        job: F,
    ) -> (Uuid, usize)
    where
        F: Future<Output = Result<Vec<String>, ApiFailure>> + Send + 'static,
    {
        self.prune_finished().await;

        let id = Uuid::new_v4();
        let entry = TaskEntry {
            state: TaskState::Pending,
            images: None,
            failure: None,
            session_id,
            save_images,
            created_at: Self::now(),
            finished_at: None,
        };

        self.tasks.write().await.insert(id, entry);
        let position = {
            let mut pending = self.pending.write().await;
            pending.push_back(id);
            pending.len() - 1
        };
        crate::metrics::update_pending_tasks(position + 1);
        debug!("Task {} submitted at queue position {}", id, position);

        let queue = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = job.await;
            queue.complete(id, outcome).await;
        });

        (id, position)
    }

    /// Record a task's terminal state and advance the turn queue.
    pub(crate) async fn complete(&self, id: Uuid, outcome: Result<Vec<String>, ApiFailure>) {
        {
            let mut tasks = self.tasks.write().await;
            let Some(entry) = tasks.get_mut(&id) else {
                warn!("Task {} finished but was already pruned", id);
                return;
            };

            entry.finished_at = Some(Self::now());
            match outcome {
                Ok(images) => {
                    info!("Task {} finished with {} image(s)", id, images.len());
                    entry.state = TaskState::Success;
                    entry.images = Some(images);
                }
                Err(failure) => {
                    warn!("Task {} failed: {}", id, failure);
                    crate::metrics::record_generation_failure(failure.code());
                    entry.state = TaskState::Failure;
                    entry.failure = Some(failure);
                }
            }
            crate::metrics::record_task_finished(entry.state);
        }

        let mut pending = self.pending.write().await;
        pending.retain(|queued| *queued != id);
        crate::metrics::update_pending_tasks(pending.len());
    }

    pub async fn status(&self, id: &Uuid) -> Option<TaskEntry> {
        self.tasks.read().await.get(id).cloned()
    }

    /// Position in the turn queue; `None` once the task left it.
    pub async fn queue_position(&self, id: &Uuid) -> Option<usize> {
        self.pending
            .read()
            .await
            .iter()
            .position(|queued| queued == id)
    }

    pub async fn pending_len(&self) -> usize {
        self.pending.read().await.len()
    }

    /// Drop finished entries past the retention window.
    async fn prune_finished(&self) {
        let cutoff = Self::now() - self.retention_minutes * 60;
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|_, entry| match entry.finished_at {
            Some(finished) => finished > cutoff,
            None => true,
        });
        let pruned = before - tasks.len();
        if pruned > 0 {
            debug!("Pruned {} finished task(s)", pruned);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future;

    fn queue() -> Arc<TaskQueue> {
        Arc::new(TaskQueue::new(10))
    }

    #[tokio::test]
    async fn test_submit_reports_queue_positions() {
        let queue = queue();
        let (first, pos1) = queue
            .submit("sid-1".to_string(), false, future::pending())
            .await;
        let (second, pos2) = queue
            .submit("sid-1".to_string(), false, future::pending())
            .await;

        assert_eq!(pos1, 0);
        assert_eq!(pos2, 1);
        assert_eq!(queue.queue_position(&first).await, Some(0));
        assert_eq!(queue.queue_position(&second).await, Some(1));
        assert_eq!(queue.pending_len().await, 2);
    }

    #[tokio::test]
    async fn test_complete_success_records_images() {
        let queue = queue();
        let (id, _) = queue
            .submit("sid-1".to_string(), true, future::pending())
            .await;

        queue
            .complete(id, Ok(vec!["data:image/png;base64,QQ==".to_string()]))
            .await;

        let entry = queue.status(&id).await.unwrap();
        assert_eq!(entry.state, TaskState::Success);
        assert_eq!(entry.images.as_ref().unwrap().len(), 1);
        assert!(entry.save_images);
        assert!(entry.finished_at.is_some());
        assert_eq!(queue.queue_position(&id).await, None);
        assert_eq!(queue.pending_len().await, 0);
    }

    #[tokio::test]
    async fn test_complete_failure_records_failure() {
        let queue = queue();
        let (id, _) = queue
            .submit("sid-1".to_string(), false, future::pending())
            .await;

        queue.complete(id, Err(ApiFailure::NoImagesReturned)).await;

        let entry = queue.status(&id).await.unwrap();
        assert_eq!(entry.state, TaskState::Failure);
        assert_eq!(entry.failure, Some(ApiFailure::NoImagesReturned));
        assert!(entry.images.is_none());
    }

    #[tokio::test]
    async fn test_spawned_job_completes_on_its_own() {
        let queue = queue();
        let (id, _) = queue
            .submit("sid-1".to_string(), false, async {
                Ok(vec!["data:image/png;base64,QQ==".to_string()])
            })
            .await;

        // Give the spawned task a moment to run.
        for _ in 0..50 {
            if queue.status(&id).await.unwrap().state != TaskState::Pending {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        assert_eq!(queue.status(&id).await.unwrap().state, TaskState::Success);
    }

    #[tokio::test]
    async fn test_finished_tasks_are_pruned() {
        let queue = Arc::new(TaskQueue::new(0));
        let (id, _) = queue
            .submit("sid-1".to_string(), false, future::pending())
            .await;
        queue.complete(id, Ok(vec![])).await;

        // Backdate the finish stamp past the (zero-minute) retention window.
        queue.tasks.write().await.get_mut(&id).unwrap().finished_at = Some(TaskQueue::now() - 1);

        let (_, _) = queue
            .submit("sid-2".to_string(), false, future::pending())
            .await;
        assert!(queue.status(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_task_has_no_status() {
        let queue = queue();
        assert!(queue.status(&Uuid::new_v4()).await.is_none());
    }
}
