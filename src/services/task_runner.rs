use std::fmt;
use std::sync::Arc;

use crate::models::plan::{Plan, PlanPatch};
use crate::models::plan_request::GenerationInput;
use crate::models::task::GenerationTask;
use crate::services::ai_content::ContentGenerator;
use crate::services::fallback_content;
use crate::services::image_resolver::{ImageError, ImageResolver};
use crate::services::plan_store::{PlanStore, StoreError};

#[derive(Debug)]
pub enum TaskError {
    PlanNotFound(String),
    Store(StoreError),
    Image(ImageError),
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskError::PlanNotFound(plan_id) => write!(f, "Plan {} not found", plan_id),
            TaskError::Store(err) => write!(f, "{}", err),
            TaskError::Image(err) => write!(f, "Image generation failed: {}", err),
        }
    }
}

impl std::error::Error for TaskError {}

impl From<StoreError> for TaskError {
    fn from(err: StoreError) -> Self {
        TaskError::Store(err)
    }
}

impl From<ImageError> for TaskError {
    fn from(err: ImageError) -> Self {
        TaskError::Image(err)
    }
}

/// Executes one generation task: produce the content, patch the plan, flip the flags.
pub struct GenerationTaskRunner {
    plans: Arc<dyn PlanStore>,
    content: Arc<dyn ContentGenerator>,
    images: Arc<ImageResolver>,
}

impl GenerationTaskRunner {
    pub fn new(
        plans: Arc<dyn PlanStore>,
        content: Arc<dyn ContentGenerator>,
        images: Arc<ImageResolver>,
    ) -> Self {
        Self {
            plans,
            content,
            images,
        }
    }

    pub async fn run(&self, task: &GenerationTask) -> Result<(), TaskError> {
        match task {
            GenerationTask::GenerateImage { plan_id, prompt } => {
                let source = self.images.generate_and_store(plan_id, prompt).await?;
                log::info!("Stored {:?} image for plan {}", source, plan_id);
                Ok(())
            }
            GenerationTask::PrepareBatch1 { plan_id } => {
                let input = self.load_input(plan_id).await?;
                let content = match self.content.generate_batch1(&input).await {
                    Ok(content) => content,
                    Err(e) => {
                        log::warn!("Batch 1 AI generation failed for plan {}, using fallback: {}", plan_id, e);
                        fallback_content::build_batch1(
                            &input.prompt_text,
                            &input.activity_preferences,
                            input.companion.as_deref(),
                        )
                    }
                };
                self.apply(plan_id, PlanPatch::Batch1(content)).await
            }
            GenerationTask::PrepareBatch2 { plan_id } => {
                let input = self.load_input(plan_id).await?;
                let content = match self.content.generate_batch2(&input).await {
                    Ok(content) => content,
                    Err(e) => {
                        log::warn!("Batch 2 AI generation failed for plan {}, using fallback: {}", plan_id, e);
                        fallback_content::build_batch2(&input.prompt_text, &input.activity_preferences)
                    }
                };
                self.apply(plan_id, PlanPatch::Batch2(content)).await
            }
            GenerationTask::PrepareBatch3 { plan_id } => {
                let input = self.load_input(plan_id).await?;
                let content = match self.content.generate_batch3(&input).await {
                    Ok(content) => content,
                    Err(e) => {
                        log::warn!("Batch 3 AI generation failed for plan {}, using fallback: {}", plan_id, e);
                        fallback_content::build_batch3(
                            &input.prompt_text,
                            &input.activity_preferences,
                            input.companion.as_deref(),
                        )
                    }
                };
                self.apply(plan_id, PlanPatch::Batch3(content)).await
            }
        }
    }

    async fn load_input(&self, plan_id: &str) -> Result<GenerationInput, TaskError> {
        let plan: Plan = self
            .plans
            .get_plan(plan_id)
            .await?
            .ok_or_else(|| TaskError::PlanNotFound(plan_id.to_string()))?;
        Ok(GenerationInput::from_plan(&plan))
    }

    async fn apply(&self, plan_id: &str, patch: PlanPatch) -> Result<(), TaskError> {
        if self.plans.apply_patch(plan_id, &patch).await? {
            log::info!("Plan {} updated: {:?} complete", plan_id, patch.sections());
            Ok(())
        } else {
            Err(TaskError::PlanNotFound(plan_id.to_string()))
        }
    }
}
