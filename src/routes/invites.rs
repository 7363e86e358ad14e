use actix_web::{web, HttpResponse, Responder};

use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::invite::InviteRequest;
use crate::routes::AppState;
use crate::services::invite_service::InviteError;
use crate::services::plan_store::StoreError;

/*
    POST /api/plans/{id}/invites
*/
pub async fn send_invite(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    input: web::Json<InviteRequest>,
) -> impl Responder {
    let plan_id = path.into_inner();
    match state
        .invites
        .send_invite(&user.user_id, &plan_id, &input.email)
        .await
    {
        Ok(invite) => HttpResponse::Ok().json(invite),
        Err(InviteError::InvalidEmail(_)) => HttpResponse::BadRequest().body("Invalid email address"),
        Err(InviteError::Store(StoreError::InvalidId(_))) => {
            HttpResponse::BadRequest().body("Invalid plan id")
        }
        Err(InviteError::PlanNotFound(_)) => HttpResponse::NotFound().body("Plan not found"),
        Err(InviteError::NotPlanAdmin) => {
            HttpResponse::Forbidden().body("You must be a plan admin to invite others")
        }
        Err(InviteError::MailerUnavailable) => {
            HttpResponse::ServiceUnavailable().body("Email delivery is not configured")
        }
        Err(InviteError::Email(err)) => {
            log::error!("Failed to send invite for plan {}: {}", plan_id, err);
            HttpResponse::BadGateway().body("Failed to send invite email")
        }
        Err(err) => {
            log::error!("Failed to create invite for plan {}: {}", plan_id, err);
            HttpResponse::InternalServerError().body("Failed to create invite")
        }
    }
}
