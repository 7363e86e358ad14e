use actix_web::{web, HttpResponse, Responder};
use mongodb::Client;
use serde::Serialize;
use std::collections::BTreeMap;
use std::env;
use std::sync::Arc;

use crate::db::mongo::ping;

/// What `/health` reports on: the database connection and which
/// optional integrations were configured at startup.
pub struct HealthChecks {
    pub mongo: Option<Arc<Client>>,
    pub database: String,
    pub integrations: BTreeMap<String, bool>,
}

#[derive(Serialize)]
struct HealthStatus {
    status: String,
    services: BTreeMap<String, ServiceStatus>,
    environment: String,
    version: String,
}

#[derive(Serialize, Clone)]
struct ServiceStatus {
    status: String,
    details: Option<String>,
}

pub async fn health_check(checks: web::Data<HealthChecks>) -> impl Responder {
    let mut health = HealthStatus {
        status: "ok".to_string(),
        services: BTreeMap::new(),
        environment: env::var("RUST_ENV").unwrap_or("development".to_string()),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let mongo_result = check_mongodb(&checks).await;
    if mongo_result.status != "ok" {
        health.status = "degraded".to_string();
    }
    health.services.insert("mongodb".to_string(), mongo_result);

    // Integrations are optional: a missing one degrades content, not the service.
    for (name, configured) in &checks.integrations {
        let status = if *configured {
            ServiceStatus {
                status: "ok".to_string(),
                details: None,
            }
        } else {
            ServiceStatus {
                status: "not_configured".to_string(),
                details: Some("Fallback content in use".to_string()),
            }
        };
        health.services.insert(name.clone(), status);
    }

    HttpResponse::Ok().json(health)
}

async fn check_mongodb(checks: &HealthChecks) -> ServiceStatus {
    let Some(client) = &checks.mongo else {
        return ServiceStatus {
            status: "error".to_string(),
            details: Some("No MongoDB client".to_string()),
        };
    };

    match ping(client, &checks.database).await {
        Ok(()) => ServiceStatus {
            status: "ok".to_string(),
            details: Some("Connected successfully to MongoDB".to_string()),
        },
        Err(e) => {
            log::error!("MongoDB health check failed: {}", e);
            ServiceStatus {
                status: "error".to_string(),
                details: Some(format!("Failed to connect: {}", e)),
            }
        }
    }
}
