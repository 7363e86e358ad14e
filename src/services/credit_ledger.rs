use async_trait::async_trait;
use bson::{doc, Document};
use chrono::Utc;
use mongodb::{Client, Collection};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::models::user::{CreditBalance, UserProfile};

const USER_COLLECTION: &str = "Users";
const PROFILE_READ_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub enum LedgerError {
    Database(mongodb::error::Error),
    Unavailable(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::Database(err) => write!(f, "Database error: {}", err),
            LedgerError::Unavailable(msg) => write!(f, "Ledger unavailable: {}", msg),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<mongodb::error::Error> for LedgerError {
    fn from(err: mongodb::error::Error) -> Self {
        LedgerError::Database(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Debit {
    FreeCredit,
    PurchasedCredit,
    /// Both balances were already empty; nothing was taken.
    NothingToDebit,
}

#[async_trait]
pub trait CreditLedger: Send + Sync {
    /// Profile of the user, or None if the identity has no profile yet.
    async fn current_user(&self, user_id: &str) -> Result<Option<UserProfile>, LedgerError>;

    /// Takes one credit, free credits first. Never drives a balance below zero.
    async fn reduce_credits_by_one(&self, user_id: &str) -> Result<Debit, LedgerError>;

    async fn balance(&self, user_id: &str) -> Result<Option<CreditBalance>, LedgerError> {
        Ok(self
            .current_user(user_id)
            .await?
            .map(|profile| profile.balance()))
    }
}

pub struct MongoCreditLedger {
    collection: Collection<UserProfile>,
}

impl MongoCreditLedger {
    pub fn new(client: Arc<Client>, database: &str) -> Self {
        Self {
            collection: client.database(database).collection(USER_COLLECTION),
        }
    }

    async fn decrement(&self, user_id: &str, field: &str) -> Result<bool, LedgerError> {
        let mut filter = doc! { "user_id": user_id };
        filter.insert(field, doc! { "$gt": 0 });

        let mut decrement = Document::new();
        decrement.insert(field, -1);
        let update = doc! {
            "$inc": decrement,
            "$set": { "updated_at": Utc::now().to_rfc3339() },
        };

        let result = self.collection.update_one(filter, update).await?;
        Ok(result.modified_count > 0)
    }
}

#[async_trait]
impl CreditLedger for MongoCreditLedger {
    async fn current_user(&self, user_id: &str) -> Result<Option<UserProfile>, LedgerError> {
        let read = self.collection.find_one(doc! { "user_id": user_id });
        match tokio::time::timeout(PROFILE_READ_TIMEOUT, read).await {
            Ok(profile) => Ok(profile?),
            Err(_) => Err(LedgerError::Unavailable(format!(
                "profile read for {} timed out after {:?}",
                user_id, PROFILE_READ_TIMEOUT
            ))),
        }
    }

    async fn reduce_credits_by_one(&self, user_id: &str) -> Result<Debit, LedgerError> {
        if self.decrement(user_id, "free_credits").await? {
            return Ok(Debit::FreeCredit);
        }
        if self.decrement(user_id, "credits").await? {
            return Ok(Debit::PurchasedCredit);
        }

        log::warn!("No credits left to debit for user {}", user_id);
        Ok(Debit::NothingToDebit)
    }
}
