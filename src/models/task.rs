use serde::{Deserialize, Serialize};

/// A named background action together with its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "args")]
pub enum GenerationTask {
    #[serde(rename = "image:generate_and_store")]
    GenerateImage { plan_id: String, prompt: String },
    #[serde(rename = "plan:prepare_batch_1")]
    PrepareBatch1 { plan_id: String },
    #[serde(rename = "plan:prepare_batch_2")]
    PrepareBatch2 { plan_id: String },
    #[serde(rename = "plan:prepare_batch_3")]
    PrepareBatch3 { plan_id: String },
}

impl GenerationTask {
    /// The four tasks of a new plan, in scheduling order.
    pub fn for_new_plan(plan_id: &str, place_name: &str) -> [GenerationTask; 4] {
        [
            GenerationTask::GenerateImage {
                plan_id: plan_id.to_string(),
                prompt: place_name.to_string(),
            },
            GenerationTask::PrepareBatch1 {
                plan_id: plan_id.to_string(),
            },
            GenerationTask::PrepareBatch2 {
                plan_id: plan_id.to_string(),
            },
            GenerationTask::PrepareBatch3 {
                plan_id: plan_id.to_string(),
            },
        ]
    }

    pub fn action_name(&self) -> &'static str {
        match self {
            GenerationTask::GenerateImage { .. } => "image:generate_and_store",
            GenerationTask::PrepareBatch1 { .. } => "plan:prepare_batch_1",
            GenerationTask::PrepareBatch2 { .. } => "plan:prepare_batch_2",
            GenerationTask::PrepareBatch3 { .. } => "plan:prepare_batch_3",
        }
    }

    pub fn plan_id(&self) -> &str {
        match self {
            GenerationTask::GenerateImage { plan_id, .. }
            | GenerationTask::PrepareBatch1 { plan_id }
            | GenerationTask::PrepareBatch2 { plan_id }
            | GenerationTask::PrepareBatch3 { plan_id } => plan_id,
        }
    }
}

/// Where a task ended up after the orchestrator handed it off.
///
/// `Pending` moves to `Scheduled` when the queue accepted it; otherwise the
/// task is run inline and lands in `InlinedSucceeded` or `InlinedFailed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Scheduled,
    InlinedSucceeded,
    InlinedFailed,
}

impl TaskState {
    pub fn on_scheduled(self) -> TaskState {
        match self {
            TaskState::Pending => TaskState::Scheduled,
            other => other,
        }
    }

    pub fn on_inline_result(self, succeeded: bool) -> TaskState {
        match (self, succeeded) {
            (TaskState::Pending, true) => TaskState::InlinedSucceeded,
            (TaskState::Pending, false) => TaskState::InlinedFailed,
            (other, _) => other,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskReport {
    pub action: String,
    pub state: TaskState,
    pub schedule_attempts: u32,
}
