use crate::helpers::spawn_app;
use chrono::{TimeZone, Utc};
use dizai::domain::SubscriptionStatus;
use serde_json::{json, Value};

fn checkout_completed(user_id: Option<String>, email: &str, customer: &str) -> Value {
    json!({
        "id": "evt_checkout",
        "type": "checkout.session.completed",
        "data": { "object": {
            "customer": customer,
            "subscription": "sub_1",
            "customer_details": { "email": email },
            "metadata": user_id.map(|id| json!({ "userId": id })).unwrap_or(json!({}))
        }}
    })
}

fn subscription_event(kind: &str, customer: &str, status: &str, period_end: i64) -> Value {
    json!({
        "id": "evt_subscription",
        "type": kind,
        "data": { "object": {
            "id": "sub_1",
            "customer": customer,
            "status": status,
            "current_period_end": period_end
        }}
    })
}

fn invoice_event(kind: &str, customer: &str) -> Value {
    json!({
        "id": "evt_invoice",
        "type": kind,
        "data": { "object": { "id": "in_1", "customer": customer } }
    })
}

#[tokio::test]
async fn a_completed_checkout_activates_the_user() {
    // arrange
    let app = spawn_app().await;
    let user = app.register_user().await;

    // act
    let response = app
        .post_webhook(&checkout_completed(
            Some(user.id.to_string()),
            &user.email,
            "cus_abc",
        ))
        .await;

    // assert
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "received": true }));
    let stored = app.find_user(user.id).await;
    assert_eq!(stored.subscription_status, SubscriptionStatus::Active);
    assert_eq!(stored.stripe_customer_id.as_deref(), Some("cus_abc"));
    assert_eq!(stored.stripe_subscription_id.as_deref(), Some("sub_1"));
}

#[tokio::test]
async fn a_checkout_without_metadata_falls_back_to_the_email() {
    // arrange
    let app = spawn_app().await;
    let user = app.register_user().await;

    // act
    let response = app
        .post_webhook(&checkout_completed(None, &user.email.to_uppercase(), "cus_abc"))
        .await;

    // assert
    assert_eq!(200, response.status().as_u16());
    let stored = app.find_user(user.id).await;
    assert_eq!(stored.subscription_status, SubscriptionStatus::Active);
}

#[tokio::test]
async fn subscription_updates_follow_the_provider_status() {
    // arrange
    let app = spawn_app().await;
    let user = app.register_user().await;
    app.post_webhook(&checkout_completed(
        Some(user.id.to_string()),
        &user.email,
        "cus_abc",
    ))
    .await;
    let period_end = 1_893_456_000;

    // act
    let response = app
        .post_webhook(&subscription_event(
            "customer.subscription.updated",
            "cus_abc",
            "trialing",
            period_end,
        ))
        .await;

    // assert
    assert_eq!(200, response.status().as_u16());
    let stored = app.find_user(user.id).await;
    assert_eq!(stored.subscription_status, SubscriptionStatus::Trialing);
    assert_eq!(
        stored.subscription_end_date,
        Some(Utc.timestamp_opt(period_end, 0).unwrap())
    );
}

#[tokio::test]
async fn customers_are_resolved_through_the_provider_tag() {
    // arrange
    let app = spawn_app().await;
    let user = app.register_user().await;
    app.billing.tag_customer("cus_tagged", user.id);

    // act
    let response = app
        .post_webhook(&subscription_event(
            "customer.subscription.created",
            "cus_tagged",
            "active",
            1_893_456_000,
        ))
        .await;

    // assert
    assert_eq!(200, response.status().as_u16());
    let stored = app.find_user(user.id).await;
    assert_eq!(stored.subscription_status, SubscriptionStatus::Active);
    assert_eq!(stored.stripe_customer_id.as_deref(), Some("cus_tagged"));
}

#[tokio::test]
async fn payment_failures_and_recoveries_move_between_past_due_and_active() {
    // arrange
    let app = spawn_app().await;
    let user = app.register_user().await;
    app.post_webhook(&checkout_completed(
        Some(user.id.to_string()),
        &user.email,
        "cus_abc",
    ))
    .await;

    // act
    app.post_webhook(&invoice_event("invoice.payment_failed", "cus_abc"))
        .await;
    let after_failure = app.find_user(user.id).await;
    app.post_webhook(&invoice_event("invoice.payment_succeeded", "cus_abc"))
        .await;
    let after_recovery = app.find_user(user.id).await;

    // assert
    assert_eq!(after_failure.subscription_status, SubscriptionStatus::PastDue);
    assert_eq!(after_recovery.subscription_status, SubscriptionStatus::Active);
}

#[tokio::test]
async fn a_deleted_subscription_cancels_access() {
    // arrange
    let app = spawn_app().await;
    let user = app.register_user().await;
    app.post_webhook(&checkout_completed(
        Some(user.id.to_string()),
        &user.email,
        "cus_abc",
    ))
    .await;

    // act
    let response = app
        .post_webhook(&subscription_event(
            "customer.subscription.deleted",
            "cus_abc",
            "canceled",
            1_893_456_000,
        ))
        .await;

    // assert
    assert_eq!(200, response.status().as_u16());
    let stored = app.find_user(user.id).await;
    assert_eq!(stored.subscription_status, SubscriptionStatus::Canceled);
    assert!(!stored.has_access(Utc::now() + chrono::Duration::seconds(1)));
}

#[tokio::test]
async fn an_invalid_signature_is_a_400_and_changes_nothing() {
    // arrange
    let app = spawn_app().await;
    let user = app.register_user().await;
    let payload = serde_json::to_vec(&checkout_completed(
        Some(user.id.to_string()),
        &user.email,
        "cus_abc",
    ))
    .unwrap();
    let test_cases = vec![
        (Some(format!("t={},v1={}", Utc::now().timestamp(), "00".repeat(32))), "a wrong signature"),
        (Some("garbage".to_string()), "a malformed header"),
        (None, "no signature header"),
    ];

    for (signature, description) in test_cases {
        // act
        let response = app.post_webhook_raw(payload.clone(), signature).await;

        // assert
        assert_eq!(
            400,
            response.status().as_u16(),
            "The webhook did not fail with 400 Bad Request for {}.",
            description
        );
    }
    let stored = app.find_user(user.id).await;
    assert_eq!(stored.subscription_status, SubscriptionStatus::None);
    assert_eq!(stored.stripe_customer_id, None);
}

#[tokio::test]
async fn events_for_unknown_customers_are_acknowledged() {
    // arrange
    let app = spawn_app().await;

    // act
    let unresolved = app
        .post_webhook(&invoice_event("invoice.payment_failed", "cus_nobody"))
        .await;
    let unhandled = app
        .post_webhook(&json!({
            "id": "evt_other",
            "type": "customer.created",
            "data": { "object": {} }
        }))
        .await;

    // assert
    assert_eq!(200, unresolved.status().as_u16());
    assert_eq!(200, unhandled.status().as_u16());
}
