#![allow(dead_code)]

use actix_web::{web, App};
use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::{NaiveDate, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use travel_planner_api::config::{GenerationConfig, RetryPolicy};
use travel_planner_api::middleware::auth::Claims;
use travel_planner_api::models::invite::PlanInvite;
use travel_planner_api::models::plan::{
    Batch1Content, Batch2Content, Batch3Content, Coordinates, DayActivities, DayPlan,
    ItineraryItem, NewPlan, Plan, PlanPatch, TopPlace,
};
use travel_planner_api::models::plan_request::{GenerationInput, PlanRequest, TravelDates};
use travel_planner_api::models::task::GenerationTask;
use travel_planner_api::models::user::UserProfile;
use travel_planner_api::routes::{self, health::HealthChecks, AppState};
use travel_planner_api::services::ai_content::{AiError, ContentGenerator};
use travel_planner_api::services::blob_storage::{BlobStorage, StorageError};
use travel_planner_api::services::credit_ledger::{CreditLedger, Debit, LedgerError};
use travel_planner_api::services::email_service::{EmailError, Mailer};
use travel_planner_api::services::image_resolver::{
    DownloadedImage, ImageError, ImageResolver, Photo, StockPhotoProvider,
};
use travel_planner_api::services::invite_service::{InviteService, InviteStore};
use travel_planner_api::services::plan_generation::PlanGenerator;
use travel_planner_api::services::plan_store::{page_offset, PlanStore, StoreError};
use travel_planner_api::services::task_queue::{SchedulingError, TaskScheduler};
use travel_planner_api::services::task_runner::GenerationTaskRunner;

pub const TEST_SECRET: &str = "test_secret";
pub const TEST_USER: &str = "user_2abc";
pub const OTHER_USER: &str = "user_9xyz";

pub fn instant_config() -> GenerationConfig {
    GenerationConfig {
        profile_retry: RetryPolicy::new(3, Duration::ZERO),
        schedule_retry: RetryPolicy::new(3, Duration::ZERO),
        delivery_retry: RetryPolicy::new(5, Duration::ZERO),
    }
}

pub fn bearer_token(user_id: &str) -> String {
    let now = Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + 3600,
        iat: now,
        user_id: user_id.to_string(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {}", token)
}

pub fn paris_request() -> PlanRequest {
    PlanRequest {
        place_name: "Paris, France".to_string(),
        activity_preferences: vec!["culture".to_string()],
        dates_of_travel: TravelDates {
            from: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
        },
        companion: Some("couple".to_string()),
    }
}

pub fn new_plan(user_id: &str, place_name: &str, no_of_days: u32) -> NewPlan {
    NewPlan {
        user_id: user_id.to_string(),
        place_name: place_name.to_string(),
        no_of_days,
        activity_preferences: vec!["adventure".to_string()],
        from_date: None,
        to_date: None,
        companion: None,
        is_generated_using_ai: true,
    }
}

pub fn profile(user_id: &str, free_credits: i64, credits: i64) -> UserProfile {
    UserProfile {
        id: None,
        user_id: user_id.to_string(),
        email: Some("traveller@example.com".to_string()),
        credits,
        free_credits,
        created_at: None,
        updated_at: None,
    }
}

#[derive(Default)]
pub struct InMemoryPlanStore {
    plans: Mutex<HashMap<String, Plan>>,
}

impl InMemoryPlanStore {
    pub fn plan(&self, plan_id: &str) -> Option<Plan> {
        self.plans.lock().unwrap().get(plan_id).cloned()
    }

    pub fn plan_count(&self) -> usize {
        self.plans.lock().unwrap().len()
    }

    pub fn insert(&self, new_plan: NewPlan) -> String {
        let id = ObjectId::new();
        let mut plan = Plan::shell(new_plan, Utc::now());
        plan.id = Some(id);
        self.plans.lock().unwrap().insert(id.to_hex(), plan);
        id.to_hex()
    }

    pub fn publish(&self, plan_id: &str) {
        if let Some(plan) = self.plans.lock().unwrap().get_mut(plan_id) {
            plan.is_published = true;
        }
    }
}

fn check_id(plan_id: &str) -> Result<(), StoreError> {
    ObjectId::parse_str(plan_id)
        .map(|_| ())
        .map_err(|_| StoreError::InvalidId(plan_id.to_string()))
}

#[async_trait]
impl PlanStore for InMemoryPlanStore {
    async fn create_plan(&self, new_plan: NewPlan) -> Result<String, StoreError> {
        Ok(self.insert(new_plan))
    }

    async fn get_plan(&self, plan_id: &str) -> Result<Option<Plan>, StoreError> {
        check_id(plan_id)?;
        Ok(self.plan(plan_id))
    }

    async fn apply_patch(&self, plan_id: &str, patch: &PlanPatch) -> Result<bool, StoreError> {
        check_id(plan_id)?;
        match self.plans.lock().unwrap().get_mut(plan_id) {
            Some(plan) => {
                plan.apply_patch(patch);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_published(&self, plan_id: &str, is_published: bool) -> Result<bool, StoreError> {
        check_id(plan_id)?;
        match self.plans.lock().unwrap().get_mut(plan_id) {
            Some(plan) => {
                plan.is_published = is_published;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn published_plans(
        &self,
        companion: Option<&str>,
        page: u64,
        per_page: i64,
    ) -> Result<Vec<Plan>, StoreError> {
        let mut plans: Vec<Plan> = self
            .plans
            .lock()
            .unwrap()
            .values()
            .filter(|plan| plan.is_published)
            .filter(|plan| companion.map_or(true, |c| plan.companion.as_deref() == Some(c)))
            .cloned()
            .collect();
        plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let skip = page_offset(page, per_page).ok_or(StoreError::InvalidPage(page))?;

        Ok(plans
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(per_page as usize)
            .collect())
    }
}

/// Ledger holding a single profile. `failures_before_success` makes the first
/// profile fetches fail with `Unavailable`.
pub struct FakeLedger {
    profile: Mutex<Option<UserProfile>>,
    failures_before_success: AtomicU32,
    pub fetch_calls: AtomicU32,
    pub debit_calls: AtomicU32,
    pub fail_debit: bool,
}

impl FakeLedger {
    pub fn with_profile(profile: Option<UserProfile>) -> Self {
        Self {
            profile: Mutex::new(profile),
            failures_before_success: AtomicU32::new(0),
            fetch_calls: AtomicU32::new(0),
            debit_calls: AtomicU32::new(0),
            fail_debit: false,
        }
    }

    pub fn failing_fetches(self, failures: u32) -> Self {
        self.failures_before_success.store(failures, Ordering::SeqCst);
        self
    }

    pub fn failing_debit(mut self) -> Self {
        self.fail_debit = true;
        self
    }

    pub fn current(&self) -> Option<UserProfile> {
        self.profile.lock().unwrap().clone()
    }
}

#[async_trait]
impl CreditLedger for FakeLedger {
    async fn current_user(&self, _user_id: &str) -> Result<Option<UserProfile>, LedgerError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures_before_success.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_before_success
                .store(remaining - 1, Ordering::SeqCst);
            return Err(LedgerError::Unavailable("profile service timed out".to_string()));
        }
        Ok(self.current())
    }

    async fn reduce_credits_by_one(&self, _user_id: &str) -> Result<Debit, LedgerError> {
        self.debit_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_debit {
            return Err(LedgerError::Unavailable("write conflict".to_string()));
        }

        let mut guard = self.profile.lock().unwrap();
        let Some(profile) = guard.as_mut() else {
            return Ok(Debit::NothingToDebit);
        };
        if profile.free_credits > 0 {
            profile.free_credits -= 1;
            Ok(Debit::FreeCredit)
        } else if profile.credits > 0 {
            profile.credits -= 1;
            Ok(Debit::PurchasedCredit)
        } else {
            Ok(Debit::NothingToDebit)
        }
    }
}

pub fn scripted_batch1() -> Batch1Content {
    Batch1Content {
        about_the_place: "Scripted about".to_string(),
        best_time_to_visit: "Scripted spring".to_string(),
    }
}

pub fn scripted_batch2() -> Batch2Content {
    Batch2Content {
        activities_to_do: vec!["Scripted activity".to_string()],
        local_cuisine: vec!["Scripted dish".to_string()],
        packing_checklist: vec!["Scripted item".to_string()],
    }
}

pub fn scripted_batch3() -> Batch3Content {
    let item = ItineraryItem {
        itinerary_item: "Scripted stop".to_string(),
        brief_description: "Scripted description".to_string(),
    };
    Batch3Content {
        itinerary: vec![DayPlan {
            title: "Day 1".to_string(),
            activities: DayActivities {
                morning: vec![item.clone()],
                afternoon: vec![item.clone()],
                evening: vec![item],
            },
        }],
        top_places_to_visit: vec![TopPlace {
            name: "Scripted place".to_string(),
            coordinates: Coordinates { lat: 1.0, lng: 2.0 },
        }],
    }
}

/// Generator that either returns fixed content or fails every call.
pub struct FakeContentGenerator {
    pub fail: bool,
    pub calls: AtomicU32,
    pub inputs: Mutex<Vec<GenerationInput>>,
}

impl FakeContentGenerator {
    pub fn working() -> Self {
        Self {
            fail: false,
            calls: AtomicU32::new(0),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::working()
        }
    }

    fn record(&self, input: &GenerationInput) -> Result<(), AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(input.clone());
        if self.fail {
            Err(AiError::ApiError {
                status: 500,
                body: "upstream error".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ContentGenerator for FakeContentGenerator {
    async fn generate_batch1(&self, input: &GenerationInput) -> Result<Batch1Content, AiError> {
        self.record(input)?;
        Ok(scripted_batch1())
    }

    async fn generate_batch2(&self, input: &GenerationInput) -> Result<Batch2Content, AiError> {
        self.record(input)?;
        Ok(scripted_batch2())
    }

    async fn generate_batch3(&self, input: &GenerationInput) -> Result<Batch3Content, AiError> {
        self.record(input)?;
        Ok(scripted_batch3())
    }
}

pub struct FakePhotos {
    pub results: Vec<Photo>,
    pub queries: Mutex<Vec<String>>,
}

impl FakePhotos {
    pub fn with_results(urls: &[&str]) -> Self {
        Self {
            results: urls
                .iter()
                .map(|url| Photo {
                    url: url.to_string(),
                })
                .collect(),
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl StockPhotoProvider for FakePhotos {
    async fn search_photos(
        &self,
        query: &str,
        _page: u32,
        _per_page: u32,
    ) -> Result<Vec<Photo>, ImageError> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.results.clone())
    }

    async fn download(&self, _url: &str) -> Result<DownloadedImage, ImageError> {
        Ok(DownloadedImage {
            bytes: vec![0xFF, 0xD8, 0xFF],
            content_type: "image/jpeg".to_string(),
        })
    }
}

pub struct FakeStorage {
    pub fail: bool,
    pub stored: Mutex<Vec<(String, String)>>,
}

impl FakeStorage {
    pub fn working() -> Self {
        Self {
            fail: false,
            stored: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            stored: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl BlobStorage for FakeStorage {
    async fn store(&self, _bytes: Vec<u8>, content_type: &str) -> Result<String, StorageError> {
        if self.fail {
            return Err(StorageError::GcsError("bucket unreachable".to_string()));
        }
        let mut stored = self.stored.lock().unwrap();
        let id = format!("blob-{}", stored.len() + 1);
        stored.push((id.clone(), content_type.to_string()));
        Ok(id)
    }

    async fn url_for(&self, storage_id: &str) -> Option<String> {
        Some(format!("https://storage.test/{}", storage_id))
    }
}

/// Scheduler that records accepted tasks, or rejects everything.
pub struct FakeScheduler {
    pub reject: bool,
    pub attempts: AtomicU32,
    pub scheduled: Mutex<Vec<GenerationTask>>,
}

impl FakeScheduler {
    pub fn accepting() -> Self {
        Self {
            reject: false,
            attempts: AtomicU32::new(0),
            scheduled: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::accepting()
        }
    }
}

#[async_trait]
impl TaskScheduler for FakeScheduler {
    async fn schedule(&self, task: GenerationTask) -> Result<(), SchedulingError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.reject {
            return Err(SchedulingError::QueueFull(task.action_name().to_string()));
        }
        self.scheduled.lock().unwrap().push(task);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeMailer {
    pub sent: Mutex<Vec<(String, String, String)>>,
    failing: bool,
}

impl FakeMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: true,
        }
    }
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send_html(&self, to: &str, subject: &str, html: &str) -> Result<(), EmailError> {
        if self.failing {
            return Err(EmailError::ApiError("503".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), html.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeInviteStore {
    pub invites: Mutex<Vec<PlanInvite>>,
}

#[async_trait]
impl InviteStore for FakeInviteStore {
    async fn create_invite(&self, invite: PlanInvite) -> Result<(), StoreError> {
        self.invites.lock().unwrap().push(invite);
        Ok(())
    }

    async fn delete_invite(&self, token: &str) -> Result<(), StoreError> {
        self.invites.lock().unwrap().retain(|invite| invite.token != token);
        Ok(())
    }
}

/// Every collaborator wired together over in-memory fakes.
pub struct Harness {
    pub plans: Arc<InMemoryPlanStore>,
    pub ledger: Arc<FakeLedger>,
    pub content: Arc<FakeContentGenerator>,
    pub scheduler: Arc<FakeScheduler>,
    pub mailer: Arc<FakeMailer>,
    pub invite_store: Arc<FakeInviteStore>,
    pub runner: Arc<GenerationTaskRunner>,
    pub generator: Arc<PlanGenerator>,
}

impl Harness {
    pub fn new(
        ledger: FakeLedger,
        content: FakeContentGenerator,
        scheduler: FakeScheduler,
    ) -> Self {
        let plans = Arc::new(InMemoryPlanStore::default());
        let ledger = Arc::new(ledger);
        let content = Arc::new(content);
        let scheduler = Arc::new(scheduler);

        let images = Arc::new(ImageResolver::new(None, None, plans.clone()));
        let runner = Arc::new(GenerationTaskRunner::new(
            plans.clone(),
            content.clone(),
            images,
        ));
        let generator = Arc::new(PlanGenerator::new(
            plans.clone(),
            ledger.clone(),
            scheduler.clone(),
            runner.clone(),
            instant_config(),
        ));

        Self {
            plans,
            ledger,
            content,
            scheduler,
            mailer: Arc::new(FakeMailer::default()),
            invite_store: Arc::new(FakeInviteStore::default()),
            runner,
            generator,
        }
    }

    pub fn with_credits(free_credits: i64, credits: i64) -> Self {
        Self::new(
            FakeLedger::with_profile(Some(profile(TEST_USER, free_credits, credits))),
            FakeContentGenerator::working(),
            FakeScheduler::accepting(),
        )
    }

    pub fn app_state(&self, with_mailer: bool) -> AppState {
        let mailer: Option<Arc<dyn Mailer>> = if with_mailer {
            Some(self.mailer.clone())
        } else {
            None
        };

        AppState {
            generator: self.generator.clone(),
            plans: self.plans.clone(),
            ledger: self.ledger.clone(),
            invites: Arc::new(InviteService::new(
                self.plans.clone(),
                self.invite_store.clone(),
                mailer,
                "https://planner.test/".to_string(),
            )),
        }
    }
}

pub fn create_app(
    state: AppState,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .app_data(web::Data::new(HealthChecks {
            mongo: None,
            database: "TravelPlannerTest".to_string(),
            integrations: BTreeMap::from([("openai".to_string(), false)]),
        }))
        .configure(routes::configure(TEST_SECRET.to_string()))
}
