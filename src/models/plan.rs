use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::content_state::{ContentGenerationState, PlanSection};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPlace {
    pub name: String,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryItem {
    pub itinerary_item: String,
    pub brief_description: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DayActivities {
    pub morning: Vec<ItineraryItem>,
    pub afternoon: Vec<ItineraryItem>,
    pub evening: Vec<ItineraryItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub title: String,
    pub activities: DayActivities,
}

/// About-the-place and best-time-to-visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch1Content {
    pub about_the_place: String,
    pub best_time_to_visit: String,
}

/// Activities, cuisine and packing list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch2Content {
    pub activities_to_do: Vec<String>,
    pub local_cuisine: Vec<String>,
    pub packing_checklist: Vec<String>,
}

/// Day-by-day itinerary and top places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch3Content {
    pub itinerary: Vec<DayPlan>,
    pub top_places_to_visit: Vec<TopPlace>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanImage {
    pub storage_id: Option<String>,
    pub image_url: String,
}

/// A field-level update applied by exactly one generation task. Applying the
/// same patch twice leaves the plan unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanPatch {
    Image(PlanImage),
    Batch1(Batch1Content),
    Batch2(Batch2Content),
    Batch3(Batch3Content),
}

impl PlanPatch {
    /// Sections whose flags this patch flips to true.
    pub fn sections(&self) -> &'static [PlanSection] {
        match self {
            PlanPatch::Image(_) => &[PlanSection::Imagination],
            PlanPatch::Batch1(_) => &[PlanSection::AboutThePlace, PlanSection::BestTimeToVisit],
            PlanPatch::Batch2(_) => &[
                PlanSection::ActivitiesToDo,
                PlanSection::LocalCuisine,
                PlanSection::PackingChecklist,
            ],
            PlanPatch::Batch3(_) => &[PlanSection::Itinerary, PlanSection::TopPlacesToVisit],
        }
    }
}

/// Fields of a freshly created plan shell.
#[derive(Debug, Clone)]
pub struct NewPlan {
    pub user_id: String,
    pub place_name: String,
    pub no_of_days: u32,
    pub activity_preferences: Vec<String>,
    pub from_date: Option<i64>,
    pub to_date: Option<i64>,
    pub companion: Option<String>,
    pub is_generated_using_ai: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub place_name: String,
    pub no_of_days: u32,
    #[serde(default)]
    pub activity_preferences: Vec<String>,
    /// Epoch milliseconds.
    pub from_date: Option<i64>,
    pub to_date: Option<i64>,
    pub companion: Option<String>,
    pub is_generated_using_ai: bool,
    #[serde(default)]
    pub is_published: bool,
    pub storage_id: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub about_the_place: String,
    #[serde(default)]
    pub best_time_to_visit: String,
    #[serde(default)]
    pub activities_to_do: Vec<String>,
    #[serde(default)]
    pub local_cuisine: Vec<String>,
    #[serde(default)]
    pub packing_checklist: Vec<String>,
    #[serde(default)]
    pub itinerary: Vec<DayPlan>,
    #[serde(default)]
    pub top_places_to_visit: Vec<TopPlace>,
    #[serde(default)]
    pub content_generation_state: ContentGenerationState,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Plan {
    pub fn shell(new_plan: NewPlan, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            user_id: new_plan.user_id,
            place_name: new_plan.place_name,
            no_of_days: new_plan.no_of_days,
            activity_preferences: new_plan.activity_preferences,
            from_date: new_plan.from_date,
            to_date: new_plan.to_date,
            companion: new_plan.companion,
            is_generated_using_ai: new_plan.is_generated_using_ai,
            is_published: false,
            storage_id: None,
            image_url: None,
            about_the_place: String::new(),
            best_time_to_visit: String::new(),
            activities_to_do: Vec::new(),
            local_cuisine: Vec::new(),
            packing_checklist: Vec::new(),
            itinerary: Vec::new(),
            top_places_to_visit: Vec::new(),
            content_generation_state: ContentGenerationState::default(),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    pub fn apply_patch(&mut self, patch: &PlanPatch) {
        match patch {
            PlanPatch::Image(image) => {
                self.storage_id = image.storage_id.clone();
                self.image_url = Some(image.image_url.clone());
            }
            PlanPatch::Batch1(content) => {
                self.about_the_place = content.about_the_place.clone();
                self.best_time_to_visit = content.best_time_to_visit.clone();
            }
            PlanPatch::Batch2(content) => {
                self.activities_to_do = content.activities_to_do.clone();
                self.local_cuisine = content.local_cuisine.clone();
                self.packing_checklist = content.packing_checklist.clone();
            }
            PlanPatch::Batch3(content) => {
                self.itinerary = content.itinerary.clone();
                self.top_places_to_visit = content.top_places_to_visit.clone();
            }
        }
        for section in patch.sections() {
            self.content_generation_state.mark_complete(*section);
        }
    }
}

/// Longest trip a plan can cover.
pub const MAX_TRIP_DAYS: u32 = 60;

/// Inclusive number of days covered by a travel date range.
pub fn inclusive_day_count(from: NaiveDate, to: NaiveDate) -> Option<u32> {
    let days = (to - from).num_days();
    if days < 0 {
        return None;
    }
    u32::try_from(days + 1).ok()
}
