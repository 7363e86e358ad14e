mod common;

use std::sync::Arc;

use common::{new_plan, FakeInviteStore, FakeMailer, InMemoryPlanStore, OTHER_USER, TEST_USER};
use travel_planner_api::services::email_service::Mailer;
use travel_planner_api::services::invite_service::{
    is_valid_email, render_invite_email, InviteError, InviteService,
};

struct Fixture {
    plans: Arc<InMemoryPlanStore>,
    store: Arc<FakeInviteStore>,
    mailer: Arc<FakeMailer>,
    service: InviteService,
}

fn fixture() -> Fixture {
    let plans = Arc::new(InMemoryPlanStore::default());
    let store = Arc::new(FakeInviteStore::default());
    let mailer = Arc::new(FakeMailer::default());
    let service = InviteService::new(
        plans.clone(),
        store.clone(),
        Some(mailer.clone() as Arc<dyn Mailer>),
        "https://planner.test/".to_string(),
    );

    Fixture {
        plans,
        store,
        mailer,
        service,
    }
}

#[actix_rt::test]
async fn test_owner_invite_stores_token_and_sends_link() {
    let fixture = fixture();
    let plan_id = fixture.plans.insert(new_plan(TEST_USER, "Lisbon", 3));

    let response = fixture
        .service
        .send_invite(TEST_USER, &plan_id, "  friend@example.com ")
        .await
        .unwrap();
    assert_eq!(response.email, "friend@example.com");
    assert_eq!(response.plan_id, plan_id);

    let invites = fixture.store.invites.lock().unwrap();
    assert_eq!(invites.len(), 1);
    let invite = &invites[0];
    assert_eq!(invite.invited_by, TEST_USER);
    assert_eq!(invite.token.len(), 32);
    assert!(invite.token.chars().all(|c| c.is_ascii_alphanumeric()));

    let sent = fixture.mailer.sent.lock().unwrap();
    let (to, subject, html) = &sent[0];
    assert_eq!(to, "friend@example.com");
    assert!(subject.contains("Lisbon"));
    assert!(html.contains(&format!(
        "https://planner.test/plans/{}/join?token={}",
        plan_id, invite.token
    )));
}

#[actix_rt::test]
async fn test_non_owner_cannot_invite() {
    let fixture = fixture();
    let plan_id = fixture.plans.insert(new_plan(TEST_USER, "Lisbon", 3));

    let err = fixture
        .service
        .send_invite(OTHER_USER, &plan_id, "friend@example.com")
        .await
        .unwrap_err();

    assert!(matches!(err, InviteError::NotPlanAdmin));
    assert!(fixture.store.invites.lock().unwrap().is_empty());
    assert!(fixture.mailer.sent.lock().unwrap().is_empty());
}

#[actix_rt::test]
async fn test_invite_errors() {
    let fixture = fixture();

    let err = fixture
        .service
        .send_invite(TEST_USER, "65f1c0ffee00000000000004", "friend@example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, InviteError::PlanNotFound(_)));

    let err = fixture
        .service
        .send_invite(TEST_USER, "65f1c0ffee00000000000004", "friend@")
        .await
        .unwrap_err();
    assert!(matches!(err, InviteError::InvalidEmail(_)));

    let plan_id = fixture.plans.insert(new_plan(TEST_USER, "Lisbon", 3));
    let without_mailer = InviteService::new(
        fixture.plans.clone(),
        fixture.store.clone(),
        None,
        "https://planner.test".to_string(),
    );
    let err = without_mailer
        .send_invite(TEST_USER, &plan_id, "friend@example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, InviteError::MailerUnavailable));
    assert!(fixture.store.invites.lock().unwrap().is_empty());
}

#[actix_rt::test]
async fn test_failed_delivery_removes_the_invite_token() {
    let plans = Arc::new(InMemoryPlanStore::default());
    let store = Arc::new(FakeInviteStore::default());
    let plan_id = plans.insert(new_plan(TEST_USER, "Lisbon", 3));
    let service = InviteService::new(
        plans,
        store.clone(),
        Some(Arc::new(FakeMailer::failing()) as Arc<dyn Mailer>),
        "https://planner.test".to_string(),
    );

    let err = service
        .send_invite(TEST_USER, &plan_id, "friend@example.com")
        .await
        .unwrap_err();

    assert!(matches!(err, InviteError::Email(_)));
    assert!(store.invites.lock().unwrap().is_empty());
}

#[test]
fn test_email_validation() {
    assert!(is_valid_email("a.b+trip@example.co.uk"));
    assert!(!is_valid_email("plainaddress"));
    assert!(!is_valid_email("two@@example.com"));
    assert!(!is_valid_email(""));
}

#[test]
fn test_invite_email_escapes_place_name() {
    let html = render_invite_email("<Paris & Co>", "https://planner.test/x");

    assert!(html.contains("&lt;Paris &amp; Co&gt;"));
    assert!(!html.contains("<Paris"));
    assert!(html.contains("href=\"https://planner.test/x\""));
}
