use crate::helpers::{assert_error_message, spawn_app};
use dizai::domain::FeedbackFilter;
use dizai::store::Store;
use serde_json::{json, Value};

#[tokio::test]
async fn the_public_page_exposes_only_public_fields() {
    // arrange
    let app = spawn_app().await;
    app.register_subscriber().await;
    let establishment = app.create_establishment("Sorveteria").await;

    // act
    let response = app
        .get(&format!("/public/establishment/{}", establishment.slug))
        .await;

    // assert
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "establishment": {
                "id": establishment.id.to_string(),
                "name": "Sorveteria",
                "slug": establishment.slug,
                "googleReviewUrl": null,
                "showGoogleReviewPrompt": false
            }
        })
    );
}

#[tokio::test]
async fn the_public_page_of_an_unknown_slug_is_a_404() {
    // arrange
    let app = spawn_app().await;

    // act
    let response = app.get("/public/establishment/nao-existe-abc123").await;

    // assert
    assert_eq!(404, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_error_message(&body, "Estabelecimento não encontrado");
}

#[tokio::test]
async fn positive_feedback_is_stored_without_an_alert() {
    // arrange
    let app = spawn_app().await;
    app.register_subscriber().await;
    let establishment = app.create_establishment("Mercadinho").await;

    // act
    let response = app
        .post_json(
            "/feedback",
            &json!({
                "rating": "great",
                "comment": "  Adorei!  ",
                "establishmentSlug": establishment.slug
            }),
        )
        .await;

    // assert
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "success": true, "message": "Feedback enviado com sucesso" })
    );
    let saved = app
        .store
        .list_feedbacks(establishment.id, FeedbackFilter::default())
        .await
        .unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].comment.as_deref(), Some("Adorei!"));
    assert!(app.email_client.sent_emails().is_empty());
}

#[tokio::test]
async fn negative_feedback_alerts_the_owner() {
    // arrange
    let app = spawn_app().await;
    let owner = app.register_subscriber().await;
    let establishment = app.create_establishment("Pizzaria <Bella>").await;

    // act
    let response = app
        .post_json(
            "/feedback",
            &json!({
                "rating": "bad",
                "comment": "<script>alert(1)</script>",
                "establishmentSlug": establishment.slug
            }),
        )
        .await;

    // assert
    assert_eq!(200, response.status().as_u16());
    let sent = app.email_client.sent_emails();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, owner.email);
    assert_eq!(
        sent[0].subject,
        "Alerta: Feedback negativo em Pizzaria <Bella>"
    );
    assert!(!sent[0].html.contains("<script>"));
    assert!(sent[0].html.contains("&lt;script&gt;"));
    assert!(sent[0].text.contains("<script>alert(1)</script>"));
    assert!(sent[0]
        .html
        .contains(&format!("{}/dashboard", app.settings.application.base_url)));
}

#[tokio::test]
async fn a_failed_alert_does_not_fail_the_submission() {
    // arrange
    let app = spawn_app().await;
    app.register_subscriber().await;
    let establishment = app.create_establishment("Lanchonete").await;
    app.email_client.fail_deliveries();

    // act
    let response = app
        .post_json(
            "/feedback",
            &json!({ "rating": "bad", "establishmentSlug": establishment.slug }),
        )
        .await;

    // assert
    assert_eq!(200, response.status().as_u16());
    let saved = app
        .store
        .list_feedbacks(establishment.id, FeedbackFilter::default())
        .await
        .unwrap();
    assert_eq!(saved.len(), 1);
}

#[tokio::test]
async fn feedback_returns_a_400_when_data_is_invalid() {
    // arrange
    let app = spawn_app().await;
    app.register_subscriber().await;
    let establishment = app.create_establishment("Academia").await;
    let test_cases = vec![
        (json!({ "establishmentSlug": establishment.slug }), "missing the rating"),
        (json!({ "rating": "great" }), "missing the establishment"),
        (
            json!({ "rating": "excellent", "establishmentSlug": establishment.slug }),
            "an unknown rating",
        ),
    ];

    for (invalid_body, error_message) in test_cases {
        // act
        let response = app.post_json("/feedback", &invalid_body).await;

        // assert
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request when the payload was {}.",
            error_message
        );
    }
}

#[tokio::test]
async fn feedback_for_an_unknown_establishment_is_a_404() {
    // arrange
    let app = spawn_app().await;

    // act
    let response = app
        .post_json(
            "/feedback",
            &json!({ "rating": "okay", "establishmentSlug": "nao-existe" }),
        )
        .await;

    // assert
    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn malformed_json_is_a_400() {
    // arrange
    let app = spawn_app().await;

    // act
    let response = app
        .api_client
        .post(app.url("/feedback"))
        .header("Content-Type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();

    // assert
    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
}
