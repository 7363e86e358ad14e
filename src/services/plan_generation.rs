//! Plan generation saga
//!
//! Creating a plan runs in a fixed sequence:
//! 1. load the caller's profile (bounded retry)
//! 2. gate on the combined credit balance
//! 3. create the empty plan shell
//! 4. hand the image task and the three content batches to the background queue,
//!    running a task inline when it cannot be scheduled
//! 5. debit one credit
//!
//! Only the shell and the debit must succeed. Generation tasks degrade to
//! partially filled plans and never fail the request.

use std::fmt;
use std::sync::Arc;

use crate::config::GenerationConfig;
use crate::models::plan::{inclusive_day_count, NewPlan, MAX_TRIP_DAYS};
use crate::models::plan_request::{date_to_millis, PlanCreatedResponse, PlanRequest};
use crate::models::task::{GenerationTask, TaskReport, TaskState};
use crate::services::credit_ledger::{CreditLedger, LedgerError};
use crate::services::plan_store::{PlanStore, StoreError};
use crate::services::retry::with_linear_backoff;
use crate::services::task_queue::TaskScheduler;
use crate::services::task_runner::GenerationTaskRunner;

#[derive(Debug)]
pub enum PlanGenerationError {
    InvalidRequest(String),
    Store(StoreError),
    Ledger(LedgerError),
}

impl fmt::Display for PlanGenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanGenerationError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            PlanGenerationError::Store(err) => write!(f, "{}", err),
            PlanGenerationError::Ledger(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for PlanGenerationError {}

impl From<StoreError> for PlanGenerationError {
    fn from(err: StoreError) -> Self {
        PlanGenerationError::Store(err)
    }
}

impl From<LedgerError> for PlanGenerationError {
    fn from(err: LedgerError) -> Self {
        PlanGenerationError::Ledger(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    ProfileUnavailable,
    ProfileMissing,
    InsufficientCredits,
}

#[derive(Debug)]
pub enum PlanCreation {
    Created(PlanCreatedResponse),
    /// Nothing was written: no plan, no debit.
    Aborted(AbortReason),
}

pub struct PlanGenerator {
    plans: Arc<dyn PlanStore>,
    ledger: Arc<dyn CreditLedger>,
    scheduler: Arc<dyn TaskScheduler>,
    runner: Arc<GenerationTaskRunner>,
    config: GenerationConfig,
}

impl PlanGenerator {
    pub fn new(
        plans: Arc<dyn PlanStore>,
        ledger: Arc<dyn CreditLedger>,
        scheduler: Arc<dyn TaskScheduler>,
        runner: Arc<GenerationTaskRunner>,
        config: GenerationConfig,
    ) -> Self {
        Self {
            plans,
            ledger,
            scheduler,
            runner,
            config,
        }
    }

    pub async fn generate_plan(
        &self,
        user_id: &str,
        request: PlanRequest,
    ) -> Result<PlanCreation, PlanGenerationError> {
        let place_name = request.place_name.trim().to_string();
        if place_name.is_empty() {
            return Err(PlanGenerationError::InvalidRequest(
                "place_name must not be empty".to_string(),
            ));
        }
        let dates = request.dates_of_travel;
        let no_of_days = inclusive_day_count(dates.from, dates.to).ok_or_else(|| {
            PlanGenerationError::InvalidRequest("travel dates end before they start".to_string())
        })?;
        if no_of_days > MAX_TRIP_DAYS {
            return Err(PlanGenerationError::InvalidRequest(format!(
                "trips are limited to {} days, got {}",
                MAX_TRIP_DAYS, no_of_days
            )));
        }

        let profile = with_linear_backoff(
            "Loading user profile",
            self.config.profile_retry,
            |_| self.ledger.current_user(user_id),
        )
        .await;

        let profile = match profile.result {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                log::error!("Aborting plan creation: no profile for user {}", user_id);
                return Ok(PlanCreation::Aborted(AbortReason::ProfileMissing));
            }
            Err(_) => {
                log::error!(
                    "Aborting plan creation because the profile of user {} could not be retrieved after {} attempts",
                    user_id,
                    profile.attempts
                );
                return Ok(PlanCreation::Aborted(AbortReason::ProfileUnavailable));
            }
        };

        if !profile.balance().can_create_plan() {
            log::info!("Unable to create AI travel plan due to low credits, user: {}", user_id);
            return Ok(PlanCreation::Aborted(AbortReason::InsufficientCredits));
        }

        let plan_id = self
            .plans
            .create_plan(NewPlan {
                user_id: user_id.to_string(),
                place_name: place_name.clone(),
                no_of_days,
                activity_preferences: request.activity_preferences,
                from_date: Some(date_to_millis(dates.from)),
                to_date: Some(date_to_millis(dates.to)),
                companion: request
                    .companion
                    .map(|companion| companion.trim().to_string())
                    .filter(|companion| !companion.is_empty()),
                is_generated_using_ai: true,
            })
            .await?;
        log::info!("Created plan {} for user {}", plan_id, user_id);

        let mut reports = Vec::with_capacity(4);
        for task in GenerationTask::for_new_plan(&plan_id, &place_name) {
            reports.push(self.dispatch(task).await);
        }

        // Charged once scheduling is over, whatever the tasks end up doing.
        let debit = self.ledger.reduce_credits_by_one(user_id).await.map_err(|e| {
            log::error!("Failed to debit credit for plan {}: {}", plan_id, e);
            e
        })?;
        log::info!("Debited {:?} from user {} for plan {}", debit, user_id, plan_id);

        Ok(PlanCreation::Created(PlanCreatedResponse {
            redirect_to: format!("/plans/{}/plan?isNewPlan=true", plan_id),
            plan_id,
            tasks: reports,
        }))
    }

    async fn dispatch(&self, task: GenerationTask) -> TaskReport {
        let label = format!("Scheduling {} for plan {}", task.action_name(), task.plan_id());
        let scheduled = with_linear_backoff(&label, self.config.schedule_retry, |_| {
            self.scheduler.schedule(task.clone())
        })
        .await;

        let state = match scheduled.result {
            Ok(()) => TaskState::Pending.on_scheduled(),
            Err(_) => {
                let succeeded = match self.runner.run(&task).await {
                    Ok(()) => true,
                    Err(e) => {
                        log::error!(
                            "Inline execution failed for {} on plan {}: {}",
                            task.action_name(),
                            task.plan_id(),
                            e
                        );
                        false
                    }
                };
                if !succeeded {
                    log::warn!(
                        "Unable to schedule or inline {} for plan {}",
                        task.action_name(),
                        task.plan_id()
                    );
                }
                TaskState::Pending.on_inline_result(succeeded)
            }
        };

        TaskReport {
            action: task.action_name().to_string(),
            state,
            schedule_attempts: scheduled.attempts,
        }
    }
}
