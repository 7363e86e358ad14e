use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{Client, Collection};
use std::fmt;
use std::sync::Arc;

use crate::models::plan::{NewPlan, Plan, PlanPatch};

const PLAN_COLLECTION: &str = "Plans";

#[derive(Debug)]
pub enum StoreError {
    Database(mongodb::error::Error),
    InvalidId(String),
    InvalidPage(u64),
    Serialization(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Database(err) => write!(f, "Database error: {}", err),
            StoreError::InvalidId(id) => write!(f, "Invalid id: {}", id),
            StoreError::InvalidPage(page) => write!(f, "Page {} is out of range", page),
            StoreError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Database(err)
    }
}

impl From<bson::ser::Error> for StoreError {
    fn from(err: bson::ser::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Persistence of plans. Patches touch only the fields and flags they own.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Inserts an empty plan shell and returns its id.
    async fn create_plan(&self, new_plan: NewPlan) -> Result<String, StoreError>;

    async fn get_plan(&self, plan_id: &str) -> Result<Option<Plan>, StoreError>;

    /// Returns false when the plan does not exist.
    async fn apply_patch(&self, plan_id: &str, patch: &PlanPatch) -> Result<bool, StoreError>;

    async fn set_published(&self, plan_id: &str, is_published: bool) -> Result<bool, StoreError>;

    async fn published_plans(
        &self,
        companion: Option<&str>,
        page: u64,
        per_page: i64,
    ) -> Result<Vec<Plan>, StoreError>;
}

pub struct MongoPlanStore {
    collection: Collection<Plan>,
}

impl MongoPlanStore {
    pub fn new(client: Arc<Client>, database: &str) -> Self {
        Self {
            collection: client.database(database).collection(PLAN_COLLECTION),
        }
    }
}

/// Number of documents to skip for a zero-based page, if it fits a Mongo skip.
pub fn page_offset(page: u64, per_page: i64) -> Option<u64> {
    page
        .checked_mul(per_page.max(0) as u64)
        .filter(|offset| *offset <= i64::MAX as u64)
}

fn parse_plan_id(plan_id: &str) -> Result<ObjectId, StoreError> {
    ObjectId::parse_str(plan_id).map_err(|_| StoreError::InvalidId(plan_id.to_string()))
}

/// `$set` body for a patch: the owned content fields plus one dotted path per flag.
pub fn patch_document(patch: &PlanPatch) -> Result<Document, StoreError> {
    let mut set = match patch {
        PlanPatch::Image(image) => doc! {
            "storage_id": image.storage_id.clone(),
            "image_url": image.image_url.clone(),
        },
        PlanPatch::Batch1(content) => doc! {
            "about_the_place": content.about_the_place.clone(),
            "best_time_to_visit": content.best_time_to_visit.clone(),
        },
        PlanPatch::Batch2(content) => doc! {
            "activities_to_do": content.activities_to_do.clone(),
            "local_cuisine": content.local_cuisine.clone(),
            "packing_checklist": content.packing_checklist.clone(),
        },
        PlanPatch::Batch3(content) => doc! {
            "itinerary": bson::to_bson(&content.itinerary)?,
            "top_places_to_visit": bson::to_bson(&content.top_places_to_visit)?,
        },
    };

    for section in patch.sections() {
        set.insert(
            format!("content_generation_state.{}", section.flag_name()),
            true,
        );
    }
    set.insert("updated_at", bson::to_bson(&Utc::now())?);

    Ok(set)
}

#[async_trait]
impl PlanStore for MongoPlanStore {
    async fn create_plan(&self, new_plan: NewPlan) -> Result<String, StoreError> {
        let plan = Plan::shell(new_plan, Utc::now());
        let result = self.collection.insert_one(&plan).await?;

        result
            .inserted_id
            .as_object_id()
            .map(|id| id.to_hex())
            .ok_or_else(|| StoreError::Serialization("Inserted plan id is not an ObjectId".to_string()))
    }

    async fn get_plan(&self, plan_id: &str) -> Result<Option<Plan>, StoreError> {
        let id = parse_plan_id(plan_id)?;
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn apply_patch(&self, plan_id: &str, patch: &PlanPatch) -> Result<bool, StoreError> {
        let id = parse_plan_id(plan_id)?;
        let update = doc! { "$set": patch_document(patch)? };

        let result = self.collection.update_one(doc! { "_id": id }, update).await?;
        Ok(result.matched_count > 0)
    }

    async fn set_published(&self, plan_id: &str, is_published: bool) -> Result<bool, StoreError> {
        let id = parse_plan_id(plan_id)?;
        let update = doc! {
            "$set": {
                "is_published": is_published,
                "updated_at": bson::to_bson(&Utc::now())?,
            }
        };

        let result = self.collection.update_one(doc! { "_id": id }, update).await?;
        Ok(result.matched_count > 0)
    }

    async fn published_plans(
        &self,
        companion: Option<&str>,
        page: u64,
        per_page: i64,
    ) -> Result<Vec<Plan>, StoreError> {
        let skip = page_offset(page, per_page).ok_or(StoreError::InvalidPage(page))?;
        let mut filter = doc! { "is_published": true };
        if let Some(companion) = companion {
            filter.insert("companion", companion);
        }

        let cursor = self
            .collection
            .find(filter)
            .sort(doc! { "created_at": -1 })
            .skip(skip)
            .limit(per_page)
            .await?;

        Ok(cursor.try_collect().await?)
    }
}
