use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

use crate::routes::AppState;
use crate::services::plan_store::StoreError;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct CommunityQuery {
    pub companion: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<i64>,
}

pub fn page_size(requested: Option<i64>) -> i64 {
    requested.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

/*
    GET /api/community-plans?companion=&page=&per_page=
*/
pub async fn list(state: web::Data<AppState>, query: web::Query<CommunityQuery>) -> impl Responder {
    let query = query.into_inner();
    let companion = query
        .companion
        .as_deref()
        .map(str::trim)
        .filter(|companion| !companion.is_empty());

    match state
        .plans
        .published_plans(companion, query.page.unwrap_or(0), page_size(query.per_page))
        .await
    {
        Ok(plans) => HttpResponse::Ok().json(plans),
        Err(StoreError::InvalidPage(page)) => {
            HttpResponse::BadRequest().body(format!("Page {} is out of range", page))
        }
        Err(err) => {
            log::error!("Failed to retrieve community plans: {}", err);
            HttpResponse::InternalServerError().body("Failed to retrieve community plans")
        }
    }
}
