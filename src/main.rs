use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use travel_planner_api::config::AppConfig;
use travel_planner_api::db;
use travel_planner_api::routes::{self, health::HealthChecks, AppState};
use travel_planner_api::services::ai_content::{ContentGenerator, OpenAiClient};
use travel_planner_api::services::blob_storage::{BlobStorage, GcsBlobStorage};
use travel_planner_api::services::credit_ledger::{CreditLedger, MongoCreditLedger};
use travel_planner_api::services::email_service::{EmailService, Mailer};
use travel_planner_api::services::image_resolver::{ImageResolver, StockPhotoProvider, UnsplashClient};
use travel_planner_api::services::invite_service::{InviteService, MongoInviteStore};
use travel_planner_api::services::plan_generation::PlanGenerator;
use travel_planner_api::services::plan_store::{MongoPlanStore, PlanStore};
use travel_planner_api::services::task_queue::{spawn_workers, task_queue};
use travel_planner_api::services::task_runner::GenerationTaskRunner;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    } else {
        log::info!("Release mode");
    }

    let config = AppConfig::from_env().map_err(io::Error::other)?;
    log::info!("Attempting to bind to {}:{}", config.host, config.port);

    let client = db::mongo::create_mongo_client(&config.mongodb_uri, &config.database)
        .await
        .map_err(io::Error::other)?;

    let plans: Arc<dyn PlanStore> = Arc::new(MongoPlanStore::new(client.clone(), &config.database));
    let ledger: Arc<dyn CreditLedger> =
        Arc::new(MongoCreditLedger::new(client.clone(), &config.database));

    let content: Arc<dyn ContentGenerator> = Arc::new(
        OpenAiClient::new(
            config.openai_api_key.clone(),
            config.openai_model.clone(),
            config.openai_base_url.clone(),
        )
        .map_err(io::Error::other)?,
    );
    if config.openai_api_key.is_none() {
        log::warn!("OPENAI_API_KEY missing; plans will use fallback content");
    }

    let photos: Option<Arc<dyn StockPhotoProvider>> = match config.unsplash_access_key.clone() {
        Some(key) => match UnsplashClient::new(key) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                log::error!("Failed to create Unsplash client: {}", e);
                None
            }
        },
        None => None,
    };

    let storage: Option<Arc<dyn BlobStorage>> = match config.itinerary_bucket.clone() {
        Some(bucket) => match GcsBlobStorage::new(bucket).await {
            Ok(storage) => Some(Arc::new(storage)),
            Err(e) => {
                log::error!("Blob storage unavailable, images will be inlined: {}", e);
                None
            }
        },
        None => {
            log::warn!("ITINERARY_BUCKET missing; images will be inlined");
            None
        }
    };

    let mailer: Option<Arc<dyn Mailer>> = config.sendgrid_api_key.clone().map(|key| {
        Arc::new(EmailService::new(key, config.invite_from_email.clone())) as Arc<dyn Mailer>
    });

    let integrations = BTreeMap::from([
        ("openai".to_string(), config.openai_api_key.is_some()),
        ("unsplash".to_string(), photos.is_some()),
        ("cloud_storage".to_string(), storage.is_some()),
        ("sendgrid".to_string(), mailer.is_some()),
    ]);

    let images = Arc::new(ImageResolver::new(photos, storage, plans.clone()));
    let runner = Arc::new(GenerationTaskRunner::new(plans.clone(), content, images));

    let (queue, receiver) = task_queue(config.task_queue_capacity);
    let workers = spawn_workers(
        receiver,
        runner.clone(),
        config.task_workers,
        config.generation.delivery_retry,
    );
    log::info!("Started {} generation workers", workers.len());

    let generator = Arc::new(PlanGenerator::new(
        plans.clone(),
        ledger.clone(),
        Arc::new(queue),
        runner,
        config.generation,
    ));
    let invites = Arc::new(InviteService::new(
        plans.clone(),
        Arc::new(MongoInviteStore::new(client.clone(), &config.database)),
        mailer,
        config.hosting_url.clone(),
    ));

    let state = web::Data::new(AppState {
        generator,
        plans,
        ledger,
        invites,
    });
    let health = web::Data::new(HealthChecks {
        mongo: Some(client),
        database: config.database.clone(),
        integrations,
    });

    let jwt_secret = config.jwt_secret.clone();
    log::info!("Starting HTTP server...");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .app_data(state.clone())
            .app_data(health.clone())
            .configure(routes::configure(jwt_secret.clone()))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
