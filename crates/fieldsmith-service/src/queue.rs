use ahash::AHashMap;
use fieldsmith_error::{bail, ErrorType, Result};
use parking_lot::Mutex;
use std::{collections::VecDeque, sync::Arc};
use uuid::Uuid;

/// Per-workspace FIFO of job ids. The head is the one job permitted to
/// execute for that workspace; everything behind it is pending.
///
/// Queues live for the process lifetime only. Workspaces never share a
/// queue, so there is no cross-tenant contention beyond the map lock.
#[derive(Clone, Default)]
pub struct TenantQueue {
    queues: Arc<Mutex<AHashMap<Uuid, VecDeque<Uuid>>>>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Enqueued {
    /// 1-based position behind the head; 0 when the job became the head
    pub position: usize,
    /// The queue was empty, the caller must start execution now
    pub started_immediately: bool,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct QueueStatus {
    pub running: Option<Uuid>,
    pub pending: Vec<Uuid>,
    pub total: usize,
}

impl TenantQueue {
    pub fn enqueue(&self, workspace_id: Uuid, job_id: Uuid) -> Enqueued {
        let mut queues = self.queues.lock();
        let queue = queues.entry(workspace_id).or_default();
        queue.push_back(job_id);

        Enqueued {
            position: queue.len() - 1,
            started_immediately: queue.len() == 1,
        }
    }

    /// Remove the head once its run is over and return the new head, if any.
    ///
    /// The caller must pass the job that just finished; anything else means
    /// the coordinator and the queue disagree about who was running, which is
    /// a bug that must surface instead of being papered over.
    pub fn advance(&self, workspace_id: Uuid, finished: Uuid) -> Result<Option<Uuid>> {
        let mut queues = self.queues.lock();
        let Some(queue) = queues.get_mut(&workspace_id) else {
            bail!(
                type = ErrorType::InvariantViolation,
                format!("advance for workspace {workspace_id} which has no queue")
            );
        };

        match queue.front().copied() {
            Some(head) if head == finished => {
                queue.pop_front();
            }
            Some(head) => {
                bail!(
                    type = ErrorType::InvariantViolation,
                    format!("job {finished} finished but {head} is the queue head")
                );
            }
            None => {
                bail!(
                    type = ErrorType::InvariantViolation,
                    format!("advance on the empty queue of workspace {workspace_id}")
                );
            }
        }

        let next = queue.front().copied();
        if queue.is_empty() {
            queues.remove(&workspace_id);
        }

        Ok(next)
    }

    /// Drop a job that has not started yet. The head is already running and
    /// cannot be cancelled through this path.
    pub fn cancel(&self, workspace_id: Uuid, job_id: Uuid) -> bool {
        let mut queues = self.queues.lock();
        let Some(queue) = queues.get_mut(&workspace_id) else {
            return false;
        };

        let Some(position) = queue.iter().position(|id| *id == job_id) else {
            return false;
        };
        if position == 0 {
            return false;
        }

        queue.remove(position);
        true
    }

    #[must_use]
    pub fn status(&self, workspace_id: Uuid) -> QueueStatus {
        let queues = self.queues.lock();
        let Some(queue) = queues.get(&workspace_id) else {
            return QueueStatus::default();
        };

        QueueStatus {
            running: queue.front().copied(),
            pending: queue.iter().skip(1).copied().collect(),
            total: queue.len(),
        }
    }

    /// Status of every live queue, for support tooling
    #[must_use]
    pub fn snapshot(&self) -> Vec<(Uuid, QueueStatus)> {
        self.queues
            .lock()
            .iter()
            .map(|(workspace_id, queue)| {
                (
                    *workspace_id,
                    QueueStatus {
                        running: queue.front().copied(),
                        pending: queue.iter().skip(1).copied().collect(),
                        total: queue.len(),
                    },
                )
            })
            .collect()
    }
}
