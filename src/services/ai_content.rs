//! Chat-completion client producing the three content batches of a plan.
//!
//! Each batch is requested in function-call mode against a fixed JSON schema and
//! the returned arguments are decoded straight into the batch content types.
//! Every failure is returned to the caller, which is expected to fall back to
//! `fallback_content`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;

use crate::config::RetryPolicy;
use crate::models::plan::{Batch1Content, Batch2Content, Batch3Content};
use crate::models::plan_request::GenerationInput;
use crate::services::retry::retry_when;

const FUNCTION_NAME: &str = "set_travel_details";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 2000;
/// One request plus three retries of transient failures.
const DEFAULT_RETRY: RetryPolicy = RetryPolicy::new(4, Duration::from_millis(500));

const SYSTEM_PROMPT: &str =
    "You are a helpful travel assistant. Always respond with valid JSON matching the provided schema.";

pub const PROMPT_SUFFIX: &str = "Generate travel data according to the schema in JSON format. \
Do not return anything in your response outside of curly braces. \
Generate response as per the function schema provided. \
Dates given, activity preference and travelling companion may influence like 50% while generating plan.";

const BATCH1_DESCRIPTION: &str = "Generate information about a place or location according to the schema:

- About the Place: A string containing information about the place (minimum 50 words)
- Best Time to Visit: A string specifying the best time to visit

Ensure the response adheres exactly to the schema and is in valid JSON format.";

const BATCH2_DESCRIPTION: &str = "Generate recommendations for an adventurous trip:

- Top Adventures Activities: Array of 5+ activities with locations
- Local Cuisine Recommendations: Array of local food recommendations
- Packing Checklist: Array of packing items

Ensure the response adheres exactly to the schema and is in valid JSON format.";

const BATCH3_DESCRIPTION: &str = "Generate a travel itinerary and top places:

- Itinerary: Array of daily itineraries with morning/afternoon/evening activities
- Top Places to Visit: Array of places with names and coordinates

Ensure the response adheres exactly to the schema and is in valid JSON format.";

#[derive(Debug)]
pub enum AiError {
    MissingApiKey,
    HttpError(reqwest::Error),
    ApiError { status: u16, body: String },
    MissingFunctionCall,
    SchemaMismatch(String),
}

impl fmt::Display for AiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiError::MissingApiKey => write!(f, "OPENAI_API_KEY is not configured"),
            AiError::HttpError(err) => write!(f, "HTTP error: {}", err),
            AiError::ApiError { status, body } => {
                write!(f, "API error: Status: {}, Body: {}", status, body)
            }
            AiError::MissingFunctionCall => {
                write!(f, "Response is missing function call arguments")
            }
            AiError::SchemaMismatch(msg) => write!(f, "Arguments do not match schema: {}", msg),
        }
    }
}

impl std::error::Error for AiError {}

impl AiError {
    /// Rate limits, server errors and network failures are worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            AiError::HttpError(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            AiError::ApiError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for AiError {
    fn from(err: reqwest::Error) -> Self {
        AiError::HttpError(err)
    }
}

/// Source of AI-generated plan content.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate_batch1(&self, input: &GenerationInput) -> Result<Batch1Content, AiError>;
    async fn generate_batch2(&self, input: &GenerationInput) -> Result<Batch2Content, AiError>;
    async fn generate_batch3(&self, input: &GenerationInput) -> Result<Batch3Content, AiError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct FunctionDefinition<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

#[derive(Debug, Serialize)]
struct FunctionCallSelector<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    functions: Vec<FunctionDefinition<'a>>,
    function_call: FunctionCallSelector<'a>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
pub struct FunctionCall {
    pub name: Option<String>,
    pub arguments: Option<String>,
}

pub struct OpenAiClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    retry: RetryPolicy,
}

impl OpenAiClient {
    pub fn new(api_key: Option<String>, model: String, base_url: String) -> Result<Self, AiError> {
        if let Some(key) = &api_key {
            if !key.starts_with("sk-") {
                log::warn!("OPENAI_API_KEY may be malformed - expected to start with 'sk-'");
            }
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http_client,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: DEFAULT_RETRY,
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn call_function<T: DeserializeOwned>(
        &self,
        prompt: &str,
        schema: &Value,
        description: &str,
    ) -> Result<T, AiError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(AiError::MissingApiKey)?;

        log::info!(
            "Calling chat completion API with prompt: {}...",
            prompt.chars().take(200).collect::<String>()
        );

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            functions: vec![FunctionDefinition {
                name: FUNCTION_NAME,
                description,
                parameters: schema,
            }],
            function_call: FunctionCallSelector {
                name: FUNCTION_NAME,
            },
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let completion = retry_when(
            "Chat completion request",
            self.retry,
            AiError::is_transient,
            |_| self.request_completion(api_key, &request),
        )
        .await
        .result?;

        decode_function_arguments(&completion)
    }

    async fn request_completion(
        &self,
        api_key: &str,
        request: &ChatCompletionRequest<'_>,
    ) -> Result<ChatCompletionResponse, AiError> {
        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AiError::ApiError { status, body });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl ContentGenerator for OpenAiClient {
    async fn generate_batch1(&self, input: &GenerationInput) -> Result<Batch1Content, AiError> {
        let prompt = format!("{}. {}", input.prompt_text, PROMPT_SUFFIX);
        self.call_function(&prompt, &batch1_schema(), BATCH1_DESCRIPTION)
            .await
    }

    async fn generate_batch2(&self, input: &GenerationInput) -> Result<Batch2Content, AiError> {
        self.call_function(&build_prompt(input), &batch2_schema(), BATCH2_DESCRIPTION)
            .await
    }

    async fn generate_batch3(&self, input: &GenerationInput) -> Result<Batch3Content, AiError> {
        self.call_function(&build_prompt(input), &batch3_schema(), BATCH3_DESCRIPTION)
            .await
    }
}

/// Extracts and decodes the function-call arguments of the first choice.
pub fn decode_function_arguments<T: DeserializeOwned>(
    completion: &ChatCompletionResponse,
) -> Result<T, AiError> {
    let arguments = completion
        .choices
        .first()
        .and_then(|choice| choice.message.function_call.as_ref())
        .and_then(|call| call.arguments.as_deref())
        .filter(|arguments| !arguments.trim().is_empty())
        .ok_or(AiError::MissingFunctionCall)?;

    serde_json::from_str(arguments).map_err(|err| AiError::SchemaMismatch(err.to_string()))
}

/// Prompt for batches 2 and 3: the trip text plus whichever of dates, companion
/// and preferences are present.
pub fn build_prompt(input: &GenerationInput) -> String {
    let mut prompt = input.prompt_text.clone();

    if let (Some(from), Some(to)) = (input.from_date, input.to_date) {
        prompt.push_str(&format!(
            " Travel dates: {} to {}.",
            from.format("%m/%d/%Y"),
            to.format("%m/%d/%Y")
        ));
    }

    if let Some(companion) = input.companion.as_deref().map(str::trim) {
        if !companion.is_empty() {
            prompt.push_str(&format!(" Travelling with: {}.", companion));
        }
    }

    let activities: Vec<&str> = input
        .activity_preferences
        .iter()
        .map(|activity| activity.trim())
        .filter(|activity| !activity.is_empty())
        .collect();
    if !activities.is_empty() {
        prompt.push_str(&format!(" Activity preferences: {}.", activities.join(", ")));
    }

    prompt.push(' ');
    prompt.push_str(PROMPT_SUFFIX);
    prompt
}

pub fn batch1_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "about_the_place": {
                "type": "string",
                "description": "About the place in at least 50 words"
            },
            "best_time_to_visit": {
                "type": "string",
                "description": "Best time to visit"
            }
        },
        "required": ["about_the_place", "best_time_to_visit"]
    })
}

pub fn batch2_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "activities_to_do": {
                "type": "array",
                "description": "Top adventure activities, at least 5, with locations",
                "items": { "type": "string" }
            },
            "local_cuisine": {
                "type": "array",
                "description": "Local cuisine recommendations",
                "items": { "type": "string" }
            },
            "packing_checklist": {
                "type": "array",
                "description": "Packing checklist",
                "items": { "type": "string" }
            }
        },
        "required": ["activities_to_do", "local_cuisine", "packing_checklist"]
    })
}

pub fn batch3_schema() -> Value {
    let slot = json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": {
                "itinerary_item": { "type": "string" },
                "brief_description": { "type": "string" }
            },
            "required": ["itinerary_item", "brief_description"]
        }
    });

    json!({
        "type": "object",
        "properties": {
            "itinerary": {
                "type": "array",
                "description": "Day-by-day itinerary",
                "items": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "activities": {
                            "type": "object",
                            "properties": {
                                "morning": slot,
                                "afternoon": slot,
                                "evening": slot
                            },
                            "required": ["morning", "afternoon", "evening"]
                        }
                    },
                    "required": ["title", "activities"]
                }
            },
            "top_places_to_visit": {
                "type": "array",
                "description": "Top places to visit with coordinates",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "coordinates": {
                            "type": "object",
                            "properties": {
                                "lat": { "type": "number" },
                                "lng": { "type": "number" }
                            },
                            "required": ["lat", "lng"]
                        }
                    },
                    "required": ["name", "coordinates"]
                }
            }
        },
        "required": ["itinerary", "top_places_to_visit"]
    })
}
