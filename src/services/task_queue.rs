use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::config::RetryPolicy;
use crate::models::task::GenerationTask;
use crate::services::retry::with_linear_backoff;
use crate::services::task_runner::GenerationTaskRunner;

#[derive(Debug)]
pub enum SchedulingError {
    QueueFull(String),
    QueueClosed(String),
}

impl fmt::Display for SchedulingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulingError::QueueFull(action) => {
                write!(f, "Task queue is full, could not schedule {}", action)
            }
            SchedulingError::QueueClosed(action) => {
                write!(f, "Task queue is closed, could not schedule {}", action)
            }
        }
    }
}

impl std::error::Error for SchedulingError {}

/// Hands a task off for background execution with at-least-once delivery.
#[async_trait]
pub trait TaskScheduler: Send + Sync {
    async fn schedule(&self, task: GenerationTask) -> Result<(), SchedulingError>;
}

/// Sending half of the bounded background queue.
#[derive(Clone)]
pub struct TaskQueue {
    sender: mpsc::Sender<GenerationTask>,
}

/// Receiving half, shared by every worker.
#[derive(Clone)]
pub struct TaskReceiver {
    receiver: Arc<Mutex<mpsc::Receiver<GenerationTask>>>,
}

pub fn task_queue(capacity: usize) -> (TaskQueue, TaskReceiver) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (
        TaskQueue { sender },
        TaskReceiver {
            receiver: Arc::new(Mutex::new(receiver)),
        },
    )
}

#[async_trait]
impl TaskScheduler for TaskQueue {
    async fn schedule(&self, task: GenerationTask) -> Result<(), SchedulingError> {
        let action = task.action_name().to_string();
        self.sender.try_send(task).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => SchedulingError::QueueFull(action),
            mpsc::error::TrySendError::Closed(_) => SchedulingError::QueueClosed(action),
        })
    }
}

impl TaskReceiver {
    async fn next(&self) -> Option<GenerationTask> {
        self.receiver.lock().await.recv().await
    }
}

/// Starts `workers` tokio tasks draining the queue. They exit once every
/// `TaskQueue` handle has been dropped and the queue is empty.
pub fn spawn_workers(
    receiver: TaskReceiver,
    runner: Arc<GenerationTaskRunner>,
    workers: usize,
    policy: RetryPolicy,
) -> Vec<JoinHandle<()>> {
    (0..workers.max(1))
        .map(|worker_id| {
            let receiver = receiver.clone();
            let runner = runner.clone();
            tokio::spawn(async move {
                log::debug!("Generation worker {} started", worker_id);
                while let Some(task) = receiver.next().await {
                    deliver(&runner, &task, policy).await;
                }
                log::debug!("Generation worker {} stopped", worker_id);
            })
        })
        .collect()
}

/// Runs a task until it succeeds or the policy's attempts are spent.
/// Re-running is safe because every task is a field-level patch.
pub async fn deliver(
    runner: &GenerationTaskRunner,
    task: &GenerationTask,
    policy: RetryPolicy,
) -> bool {
    let label = format!("{} for plan {}", task.action_name(), task.plan_id());
    let outcome = with_linear_backoff(&label, policy, |_| runner.run(task)).await;

    match outcome.result {
        Ok(()) => true,
        Err(e) => {
            log::error!(
                "Giving up on {} after {} attempts: {}",
                label,
                outcome.attempts,
                e
            );
            false
        }
    }
}
