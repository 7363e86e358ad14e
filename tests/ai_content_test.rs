use actix_web::{web, App, HttpResponse, HttpServer};
use chrono::NaiveDate;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use travel_planner_api::config::RetryPolicy;
use travel_planner_api::models::plan::{Batch1Content, Batch3Content};
use travel_planner_api::models::plan_request::GenerationInput;
use travel_planner_api::services::ai_content::{
    batch1_schema, batch2_schema, batch3_schema, build_prompt, decode_function_arguments,
    AiError, ChatCompletionResponse, ContentGenerator, OpenAiClient, PROMPT_SUFFIX,
};

fn completion(arguments: Option<&str>) -> ChatCompletionResponse {
    serde_json::from_value(json!({
        "choices": [{
            "message": {
                "function_call": arguments.map(|args| json!({
                    "name": "set_travel_details",
                    "arguments": args,
                }))
            }
        }]
    }))
    .unwrap()
}

fn input() -> GenerationInput {
    GenerationInput {
        prompt_text: "3 day trip to Lisbon".to_string(),
        activity_preferences: vec!["culture".to_string(), " ".to_string(), "nightlife".to_string()],
        companion: Some("solo".to_string()),
        from_date: NaiveDate::from_ymd_opt(2024, 6, 1),
        to_date: NaiveDate::from_ymd_opt(2024, 6, 3),
    }
}

#[test]
fn test_prompt_includes_dates_companion_and_preferences() {
    let prompt = build_prompt(&input());

    assert!(prompt.starts_with("3 day trip to Lisbon Travel dates: 06/01/2024 to 06/03/2024."));
    assert!(prompt.contains(" Travelling with: solo."));
    assert!(prompt.contains(" Activity preferences: culture, nightlife."));
    assert!(prompt.ends_with(PROMPT_SUFFIX));
}

#[test]
fn test_prompt_skips_missing_details() {
    let bare = GenerationInput {
        prompt_text: "2 day trip to Oslo".to_string(),
        activity_preferences: vec![],
        companion: None,
        from_date: None,
        to_date: None,
    };

    assert_eq!(build_prompt(&bare), format!("2 day trip to Oslo {}", PROMPT_SUFFIX));
}

#[test]
fn test_decodes_function_arguments() {
    let response = completion(Some(
        r#"{"about_the_place": "Sunny hills", "best_time_to_visit": "Spring"}"#,
    ));

    let batch: Batch1Content = decode_function_arguments(&response).unwrap();
    assert_eq!(batch.about_the_place, "Sunny hills");
    assert_eq!(batch.best_time_to_visit, "Spring");
}

#[test]
fn test_missing_function_call_is_an_error() {
    let result: Result<Batch1Content, AiError> = decode_function_arguments(&completion(None));
    assert!(matches!(result, Err(AiError::MissingFunctionCall)));

    let empty: ChatCompletionResponse = serde_json::from_value(json!({ "choices": [] })).unwrap();
    let result: Result<Batch1Content, AiError> = decode_function_arguments(&empty);
    assert!(matches!(result, Err(AiError::MissingFunctionCall)));
}

#[test]
fn test_arguments_not_matching_schema_are_rejected() {
    let response = completion(Some(r#"{"itinerary": "not a list"}"#));
    let result: Result<Batch3Content, AiError> = decode_function_arguments(&response);
    assert!(matches!(result, Err(AiError::SchemaMismatch(_))));
}

#[test]
fn test_schemas_require_every_batch_field() {
    assert_eq!(
        batch1_schema()["required"],
        json!(["about_the_place", "best_time_to_visit"])
    );
    assert_eq!(
        batch2_schema()["required"],
        json!(["activities_to_do", "local_cuisine", "packing_checklist"])
    );
    assert_eq!(
        batch3_schema()["required"],
        json!(["itinerary", "top_places_to_visit"])
    );
}

#[actix_rt::test]
async fn test_client_without_key_fails_fast() {
    let client = OpenAiClient::new(
        None,
        "gpt-4o-mini".to_string(),
        "http://127.0.0.1:9".to_string(),
    )
    .unwrap();

    let result = client.generate_batch2(&input()).await;
    assert!(matches!(result, Err(AiError::MissingApiKey)));
}

/// Serves chat completions that fail with `failure_status` for the first `failures` calls.
fn start_completion_server(failures: u32, failure_status: u16) -> (SocketAddr, web::Data<AtomicU32>) {
    let hits = web::Data::new(AtomicU32::new(0));
    let server_hits = hits.clone();
    let server = HttpServer::new(move || {
        App::new().app_data(server_hits.clone()).route(
            "/chat/completions",
            web::post().to(move |hits: web::Data<AtomicU32>| async move {
                let hit = hits.fetch_add(1, Ordering::SeqCst) + 1;
                if hit <= failures {
                    let status = actix_web::http::StatusCode::from_u16(failure_status).unwrap();
                    return HttpResponse::build(status).body("try again");
                }
                HttpResponse::Ok().json(json!({
                    "choices": [{
                        "message": {
                            "function_call": {
                                "name": "set_travel_details",
                                "arguments": "{\"about_the_place\": \"Hills\", \"best_time_to_visit\": \"May\"}"
                            }
                        }
                    }]
                }))
            }),
        )
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let addr = server.addrs()[0];
    actix_rt::spawn(server.run());
    (addr, hits)
}

fn client_for(addr: SocketAddr) -> OpenAiClient {
    OpenAiClient::new(
        Some("sk-test".to_string()),
        "gpt-4o-mini".to_string(),
        format!("http://{}", addr),
    )
    .unwrap()
    .with_retry(RetryPolicy::new(4, Duration::ZERO))
}

#[actix_rt::test]
async fn test_transient_api_errors_are_retried() {
    let (addr, hits) = start_completion_server(2, 503);

    let batch = client_for(addr).generate_batch1(&input()).await.unwrap();

    assert_eq!(batch.about_the_place, "Hills");
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[actix_rt::test]
async fn test_client_errors_are_not_retried() {
    let (addr, hits) = start_completion_server(10, 400);

    let result = client_for(addr).generate_batch1(&input()).await;

    assert!(matches!(result, Err(AiError::ApiError { status: 400, .. })));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_rate_limits_and_server_errors_are_transient() {
    let error = |status| AiError::ApiError {
        status,
        body: String::new(),
    };

    assert!(error(429).is_transient());
    assert!(error(503).is_transient());
    assert!(!error(401).is_transient());
    assert!(!AiError::MissingFunctionCall.is_transient());
}
