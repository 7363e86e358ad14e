use std::env;
use std::time::Duration;

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;
const DATABASE: &str = "TravelPlanner";
const OPENAI_MODEL: &str = "gpt-4o-mini";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const HOSTING_URL: &str = "https://travelplannerai.site";
const INVITE_FROM_EMAIL: &str = "onboarding@travelplannerai.site";
const TASK_WORKERS: usize = 4;
const TASK_QUEUE_CAPACITY: usize = 256;

#[derive(Debug)]
pub enum ConfigError {
    Missing(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(var) => write!(f, "{} must be set", var),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Bounded retry with a delay of `base_delay * attempt` between attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GenerationConfig {
    pub profile_retry: RetryPolicy,
    pub schedule_retry: RetryPolicy,
    pub delivery_retry: RetryPolicy,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            profile_retry: RetryPolicy::new(3, Duration::from_millis(300)),
            schedule_retry: RetryPolicy::new(3, Duration::from_millis(250)),
            delivery_retry: RetryPolicy::new(5, Duration::from_secs(1)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub mongodb_uri: String,
    pub database: String,
    pub jwt_secret: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub unsplash_access_key: Option<String>,
    pub itinerary_bucket: Option<String>,
    pub sendgrid_api_key: Option<String>,
    pub invite_from_email: String,
    pub hosting_url: String,
    pub task_workers: usize,
    pub task_queue_capacity: usize,
    pub generation: GenerationConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mongodb_uri =
            env::var("MONGODB_URI").map_err(|_| ConfigError::Missing("MONGODB_URI".to_string()))?;

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("PORT is not a number: {}", raw)))?,
            Err(_) => PORT,
        };

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            log::warn!("JWT_SECRET not set; using the development secret");
            "default_secret".to_string()
        });

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| HOST.to_string()),
            port,
            mongodb_uri,
            database: env::var("MONGODB_DATABASE").unwrap_or_else(|_| DATABASE.to_string()),
            jwt_secret,
            openai_api_key: optional_var("OPENAI_API_KEY"),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| OPENAI_MODEL.to_string()),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| OPENAI_BASE_URL.to_string()),
            unsplash_access_key: optional_var("UNSPLASH_ACCESS_KEY"),
            itinerary_bucket: optional_var("ITINERARY_BUCKET"),
            sendgrid_api_key: optional_var("SENDGRID_API_KEY"),
            invite_from_email: env::var("INVITE_FROM_EMAIL")
                .unwrap_or_else(|_| INVITE_FROM_EMAIL.to_string()),
            hosting_url: env::var("HOSTING_URL").unwrap_or_else(|_| HOSTING_URL.to_string()),
            task_workers: parse_or("TASK_WORKERS", TASK_WORKERS)?,
            task_queue_capacity: parse_or("TASK_QUEUE_CAPACITY", TASK_QUEUE_CAPACITY)?,
            generation: GenerationConfig::default(),
        })
    }
}

// Blank values count as unset.
fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_or(name: &str, default: usize) -> Result<usize, ConfigError> {
    match env::var(name) {
        Ok(raw) => match raw.parse::<usize>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(ConfigError::Invalid(format!(
                "{} must be a positive integer, got {}",
                name, raw
            ))),
        },
        Err(_) => Ok(default),
    }
}
