use actix_web::{web, HttpResponse, Responder};

use crate::middleware::auth_context::AuthenticatedUser;
use crate::routes::AppState;

/*
    GET /api/users/me/credits
*/
pub async fn get_balance(state: web::Data<AppState>, user: AuthenticatedUser) -> impl Responder {
    match state.ledger.balance(&user.user_id).await {
        Ok(Some(balance)) => HttpResponse::Ok().json(balance),
        Ok(None) => HttpResponse::NotFound().body("User profile not found"),
        Err(err) => {
            log::error!("Failed to load credits of user {}: {}", user.user_id, err);
            HttpResponse::ServiceUnavailable().body("Credit balance is temporarily unavailable")
        }
    }
}
