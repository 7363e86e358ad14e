use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserProfile {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Subject id issued by the identity provider.
    pub user_id: String,
    pub email: Option<String>,
    #[serde(default)]
    pub credits: i64,
    #[serde(default)]
    pub free_credits: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn balance(&self) -> CreditBalance {
        CreditBalance::new(self.free_credits, self.credits)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditBalance {
    pub free_credits: i64,
    pub credits: i64,
    pub total: i64,
}

impl CreditBalance {
    // Stored negatives are treated as an empty balance.
    pub fn new(free_credits: i64, credits: i64) -> Self {
        let free_credits = free_credits.max(0);
        let credits = credits.max(0);
        Self {
            free_credits,
            credits,
            total: free_credits + credits,
        }
    }

    pub fn can_create_plan(&self) -> bool {
        self.total > 0
    }
}
