use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::content_state::ContentStateView;
use crate::models::plan::Plan;
use crate::models::plan_request::{PlanRequest, VisibilityRequest};
use crate::routes::AppState;
use crate::services::plan_generation::{AbortReason, PlanCreation, PlanGenerationError};
use crate::services::plan_store::StoreError;

/*
    POST /api/plans
*/
pub async fn create(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    input: web::Json<PlanRequest>,
) -> impl Responder {
    match state
        .generator
        .generate_plan(&user.user_id, input.into_inner())
        .await
    {
        Ok(PlanCreation::Created(created)) => HttpResponse::Created().json(created),
        Ok(PlanCreation::Aborted(AbortReason::InsufficientCredits)) => {
            HttpResponse::PaymentRequired().body("Not enough credits to create a travel plan")
        }
        Ok(PlanCreation::Aborted(AbortReason::ProfileMissing)) => {
            HttpResponse::NotFound().body("User profile not found")
        }
        Ok(PlanCreation::Aborted(AbortReason::ProfileUnavailable)) => {
            HttpResponse::ServiceUnavailable().body("User profile is temporarily unavailable")
        }
        Err(PlanGenerationError::InvalidRequest(msg)) => HttpResponse::BadRequest().body(msg),
        Err(err) => {
            log::error!("Failed to create plan for user {}: {}", user.user_id, err);
            HttpResponse::InternalServerError().body("Failed to create plan")
        }
    }
}

/*
    GET /api/plans/{id}
*/
pub async fn get_by_id(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> impl Responder {
    let plan_id = path.into_inner();
    match load_readable(&state, &user, &plan_id).await {
        Ok(plan) => HttpResponse::Ok().json(plan),
        Err(response) => response,
    }
}

#[derive(Debug, Deserialize)]
pub struct ContentStateQuery {
    pub weather: Option<bool>,
}

/*
    GET /api/plans/{id}/content-state?weather=
*/
pub async fn content_state(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    query: web::Query<ContentStateQuery>,
) -> impl Responder {
    let plan_id = path.into_inner();
    match load_readable(&state, &user, &plan_id).await {
        Ok(plan) => HttpResponse::Ok().json(ContentStateView::new(
            plan_id,
            plan.content_generation_state,
            query.weather.unwrap_or(false),
        )),
        Err(response) => response,
    }
}

/*
    PUT /api/plans/{id}/visibility
*/
pub async fn set_visibility(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    input: web::Json<VisibilityRequest>,
) -> impl Responder {
    let plan_id = path.into_inner();
    let plan = match find_plan(&state, &plan_id).await {
        Ok(plan) => plan,
        Err(response) => return response,
    };
    if !plan.is_owned_by(&user.user_id) {
        return HttpResponse::Forbidden().body("Only the plan owner can change its visibility");
    }

    match state.plans.set_published(&plan_id, input.is_published).await {
        Ok(true) => HttpResponse::Ok().json(json!({
            "plan_id": plan_id,
            "is_published": input.is_published,
        })),
        Ok(false) => HttpResponse::NotFound().body("Plan not found"),
        Err(err) => {
            log::error!("Failed to update visibility of plan {}: {}", plan_id, err);
            HttpResponse::InternalServerError().body("Failed to update plan")
        }
    }
}

async fn find_plan(state: &AppState, plan_id: &str) -> Result<Plan, HttpResponse> {
    match state.plans.get_plan(plan_id).await {
        Ok(Some(plan)) => Ok(plan),
        Ok(None) => Err(HttpResponse::NotFound().body("Plan not found")),
        Err(StoreError::InvalidId(_)) => Err(HttpResponse::BadRequest().body("Invalid plan id")),
        Err(err) => {
            log::error!("Failed to retrieve plan {}: {}", plan_id, err);
            Err(HttpResponse::InternalServerError().body("Failed to retrieve plan"))
        }
    }
}

// Owners always see their plan; others only once it is published.
async fn load_readable(
    state: &AppState,
    user: &AuthenticatedUser,
    plan_id: &str,
) -> Result<Plan, HttpResponse> {
    let plan = find_plan(state, plan_id).await?;
    if plan.is_owned_by(&user.user_id) || plan.is_published {
        Ok(plan)
    } else {
        Err(HttpResponse::Forbidden().body("You do not have access to this plan"))
    }
}
