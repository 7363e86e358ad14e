use async_trait::async_trait;
use bson::doc;
use chrono::Utc;
use mongodb::{Client, Collection};
use rand::{distributions::Alphanumeric, Rng};
use regex::Regex;
use std::fmt;
use std::sync::{Arc, LazyLock};

use crate::models::invite::{InviteResponse, PlanInvite};
use crate::services::email_service::{EmailError, Mailer};
use crate::services::plan_store::{PlanStore, StoreError};

const INVITE_COLLECTION: &str = "Invites";
const TOKEN_LENGTH: usize = 32;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?)*$",
    )
    .expect("valid email pattern")
});

#[derive(Debug)]
pub enum InviteError {
    InvalidEmail(String),
    PlanNotFound(String),
    NotPlanAdmin,
    MailerUnavailable,
    Store(StoreError),
    Email(EmailError),
}

impl fmt::Display for InviteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InviteError::InvalidEmail(email) => write!(f, "Invalid email address: {}", email),
            InviteError::PlanNotFound(plan_id) => write!(f, "Plan {} not found", plan_id),
            InviteError::NotPlanAdmin => write!(f, "You must be a plan admin to invite others"),
            InviteError::MailerUnavailable => write!(f, "Email delivery is not configured"),
            InviteError::Store(err) => write!(f, "{}", err),
            InviteError::Email(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for InviteError {}

impl From<StoreError> for InviteError {
    fn from(err: StoreError) -> Self {
        InviteError::Store(err)
    }
}

impl From<EmailError> for InviteError {
    fn from(err: EmailError) -> Self {
        InviteError::Email(err)
    }
}

#[async_trait]
pub trait InviteStore: Send + Sync {
    async fn create_invite(&self, invite: PlanInvite) -> Result<(), StoreError>;

    async fn delete_invite(&self, token: &str) -> Result<(), StoreError>;
}

pub struct MongoInviteStore {
    collection: Collection<PlanInvite>,
}

impl MongoInviteStore {
    pub fn new(client: Arc<Client>, database: &str) -> Self {
        Self {
            collection: client.database(database).collection(INVITE_COLLECTION),
        }
    }
}

#[async_trait]
impl InviteStore for MongoInviteStore {
    async fn create_invite(&self, invite: PlanInvite) -> Result<(), StoreError> {
        self.collection.insert_one(&invite).await?;
        Ok(())
    }

    async fn delete_invite(&self, token: &str) -> Result<(), StoreError> {
        self.collection.delete_one(doc! { "token": token }).await?;
        Ok(())
    }
}

pub struct InviteService {
    plans: Arc<dyn PlanStore>,
    invites: Arc<dyn InviteStore>,
    mailer: Option<Arc<dyn Mailer>>,
    hosting_url: String,
}

impl InviteService {
    pub fn new(
        plans: Arc<dyn PlanStore>,
        invites: Arc<dyn InviteStore>,
        mailer: Option<Arc<dyn Mailer>>,
        hosting_url: String,
    ) -> Self {
        Self {
            plans,
            invites,
            mailer,
            hosting_url: hosting_url.trim_end_matches('/').to_string(),
        }
    }

    /// Invites `email` to collaborate on a plan owned by `user_id`.
    pub async fn send_invite(
        &self,
        user_id: &str,
        plan_id: &str,
        email: &str,
    ) -> Result<InviteResponse, InviteError> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(InviteError::InvalidEmail(email.to_string()));
        }

        let plan = self
            .plans
            .get_plan(plan_id)
            .await?
            .ok_or_else(|| InviteError::PlanNotFound(plan_id.to_string()))?;
        if !plan.is_owned_by(user_id) {
            log::info!("{} is not plan admin of {} to invite others", user_id, plan_id);
            return Err(InviteError::NotPlanAdmin);
        }

        let mailer = self.mailer.as_ref().ok_or(InviteError::MailerUnavailable)?;

        let token = generate_token();
        self.invites
            .create_invite(PlanInvite {
                id: None,
                plan_id: plan_id.to_string(),
                email: email.to_string(),
                token: token.clone(),
                invited_by: user_id.to_string(),
                created_at: Utc::now(),
            })
            .await?;

        let link = format!("{}/plans/{}/join?token={}", self.hosting_url, plan_id, token);
        let subject = format!("You're invited to plan a trip to {}", plan.place_name);
        if let Err(err) = mailer
            .send_html(email, &subject, &render_invite_email(&plan.place_name, &link))
            .await
        {
            log::error!("Failed to send invite for plan {} to {}: {}", plan_id, email, err);
            // An undelivered invite must not leave a usable join token behind.
            if let Err(cleanup) = self.invites.delete_invite(&token).await {
                log::error!("Failed to remove undelivered invite for plan {}: {}", plan_id, cleanup);
            }
            return Err(InviteError::Email(err));
        }

        log::info!("Invite for plan {} sent to {}", plan_id, email);
        Ok(InviteResponse {
            plan_id: plan_id.to_string(),
            email: email.to_string(),
        })
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

pub fn render_invite_email(place_name: &str, link: &str) -> String {
    let place = place_name
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");

    format!(
        "<html><body style=\"font-family: Arial, sans-serif;\">\
<h2>Join the trip to {place}</h2>\
<p>You have been invited to collaborate on a travel plan for {place}.</p>\
<p><a href=\"{link}\">Accept the invite</a></p>\
<p>If you were not expecting this email you can ignore it.</p>\
</body></html>"
    )
}
