use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use super::plan::Plan;
use super::task::TaskReport;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TravelDates {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    pub place_name: String,
    #[serde(default)]
    pub activity_preferences: Vec<String>,
    pub dates_of_travel: TravelDates,
    pub companion: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanCreatedResponse {
    pub plan_id: String,
    pub redirect_to: String,
    pub tasks: Vec<TaskReport>,
}

#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    pub is_published: bool,
}

/// Everything a content generator needs to know about a trip.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationInput {
    pub prompt_text: String,
    pub activity_preferences: Vec<String>,
    pub companion: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

impl GenerationInput {
    pub fn from_plan(plan: &Plan) -> Self {
        Self {
            prompt_text: format!("{} day trip to {}", plan.no_of_days, plan.place_name),
            activity_preferences: plan.activity_preferences.clone(),
            companion: plan.companion.clone(),
            from_date: plan.from_date.and_then(millis_to_date),
            to_date: plan.to_date.and_then(millis_to_date),
        }
    }
}

pub fn date_to_millis(date: NaiveDate) -> i64 {
    date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis()
}

fn millis_to_date(millis: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(millis).map(|datetime| datetime.date_naive())
}
