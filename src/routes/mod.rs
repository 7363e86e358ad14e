use actix_web::web;
use std::sync::Arc;

use crate::middleware::auth::AuthMiddleware;
use crate::services::credit_ledger::CreditLedger;
use crate::services::invite_service::InviteService;
use crate::services::plan_generation::PlanGenerator;
use crate::services::plan_store::PlanStore;

pub mod community;
pub mod credits;
pub mod health;
pub mod invites;
pub mod plans;

/// Services shared by every request handler.
pub struct AppState {
    pub generator: Arc<PlanGenerator>,
    pub plans: Arc<dyn PlanStore>,
    pub ledger: Arc<dyn CreditLedger>,
    pub invites: Arc<InviteService>,
}

pub fn configure(jwt_secret: String) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(jwt_secret))
                    .service(
                        web::scope("/plans")
                            .route("", web::post().to(plans::create))
                            .route("/{id}", web::get().to(plans::get_by_id))
                            .route(
                                "/{id}/content-state",
                                web::get().to(plans::content_state),
                            )
                            .route("/{id}/visibility", web::put().to(plans::set_visibility))
                            .route("/{id}/invites", web::post().to(invites::send_invite)),
                    )
                    .route("/community-plans", web::get().to(community::list))
                    .route("/users/me/credits", web::get().to(credits::get_balance)),
            );
    }
}
