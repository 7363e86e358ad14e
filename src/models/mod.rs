pub mod content_state;
pub mod invite;
pub mod plan;
pub mod plan_request;
pub mod task;
pub mod user;
