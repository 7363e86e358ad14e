pub mod ai_content;
pub mod blob_storage;
pub mod credit_ledger;
pub mod email_service;
pub mod fallback_content;
pub mod image_resolver;
pub mod invite_service;
pub mod plan_generation;
pub mod plan_store;
pub mod retry;
pub mod task_queue;
pub mod task_runner;
