use crate::helpers::{assert_error_message, spawn_app};
use serde_json::{json, Value};

#[tokio::test]
async fn checkout_creates_a_customer_once_and_returns_the_session() {
    // arrange
    let app = spawn_app().await;
    let user = app.register_user().await;

    // act
    let first = app.post_json("/stripe/checkout", &json!({})).await;
    let second = app.post_json("/stripe/checkout", &json!({})).await;

    // assert
    assert_eq!(200, first.status().as_u16());
    assert_eq!(200, second.status().as_u16());
    let body: Value = first.json().await.unwrap();
    assert_eq!(body["sessionId"], "cs_test_1");
    assert_eq!(body["url"], "https://checkout.test/cs_test_1");

    assert_eq!(app.billing.customer_count(), 1);
    let stored = app.find_user(user.id).await;
    assert_eq!(stored.stripe_customer_id.as_deref(), Some("cus_test_1"));
    assert_eq!(
        app.billing.checkout_sessions(),
        vec![
            ("cus_test_1".to_string(), user.id),
            ("cus_test_1".to_string(), user.id)
        ]
    );
}

#[tokio::test]
async fn checkout_requires_a_session() {
    // arrange
    let app = spawn_app().await;

    // act
    let response = app.post_json("/stripe/checkout", &json!({})).await;

    // assert
    assert_eq!(401, response.status().as_u16());
    assert_eq!(app.billing.customer_count(), 0);
}

#[tokio::test]
async fn the_portal_needs_a_billing_customer() {
    // arrange
    let app = spawn_app().await;
    app.register_user().await;

    // act
    let response = app.post_json("/stripe/portal", &json!({})).await;

    // assert
    assert_eq!(404, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_error_message(&body, "Nenhuma assinatura encontrada");
}

#[tokio::test]
async fn the_portal_opens_for_existing_customers() {
    // arrange
    let app = spawn_app().await;
    app.register_user().await;
    app.post_json("/stripe/checkout", &json!({})).await;

    // act
    let response = app.post_json("/stripe/portal", &json!({})).await;

    // assert
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["url"], "https://billing.test/portal/cus_test_1");
}
