use crate::helpers::{spawn_app, TestApp, CRON_SECRET};
use chrono::{Duration, Utc};
use dizai::domain::{Establishment, EstablishmentChanges, Rating, SubscriptionStatus};
use dizai::store::Store;
use serde_json::{json, Value};

async fn subscriber_with_establishment(app: &TestApp, name: &str) -> Establishment {
    app.post_json("/auth/logout", &json!({})).await;
    app.register_subscriber().await;
    app.create_establishment(name).await
}

#[tokio::test]
async fn the_report_endpoints_require_the_cron_secret() {
    // arrange
    let app = spawn_app().await;

    for path in ["/cron/weekly-report", "/cron/weekly-reports"] {
        for secret in [None, Some("wrong-secret")] {
            // act
            let response = app.cron_get(path, secret).await;

            // assert
            assert_eq!(
                401,
                response.status().as_u16(),
                "{} accepted the secret {:?}",
                path,
                secret
            );
        }
    }
}

#[tokio::test]
async fn weekly_reports_are_sent_skipped_or_filtered() {
    // arrange
    let app = spawn_app().await;
    let now = Utc::now();
    let busy = subscriber_with_establishment(&app, "Movimentado").await;
    app.add_feedback_at(busy.id, Rating::Great, Some("Ótimo atendimento"), now - Duration::days(1)).await;
    app.add_feedback_at(busy.id, Rating::Great, None, now - Duration::days(2)).await;
    app.add_feedback_at(busy.id, Rating::Bad, Some("Demorou"), now - Duration::days(3)).await;
    app.add_feedback_at(busy.id, Rating::Okay, None, now - Duration::days(9)).await;
    let quiet = subscriber_with_establishment(&app, "Tranquilo").await;
    let muted = subscriber_with_establishment(&app, "Silenciado").await;
    app.store
        .update_establishment(
            muted.id,
            EstablishmentChanges {
                weekly_reports_enabled: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let lapsed = subscriber_with_establishment(&app, "Inadimplente").await;
    app.set_subscription(lapsed.user_id, SubscriptionStatus::PastDue)
        .await;

    // act
    let response = app.cron_get("/cron/weekly-report", Some(CRON_SECRET)).await;

    // assert
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Weekly reports processed");
    assert_eq!(body["total"], 2);
    assert_eq!(body["sent"], 1);
    assert_eq!(body["skipped"], 1);
    assert_eq!(body["errors"], 0);
    let statuses: Vec<(String, String)> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| {
            (
                r["establishmentId"].as_str().unwrap().to_string(),
                r["status"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert!(statuses.contains(&(busy.id.to_string(), "sent".to_string())));
    assert!(statuses.contains(&(quiet.id.to_string(), "skipped".to_string())));

    let sent = app.email_client.sent_emails();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, busy.alert_email);
    assert_eq!(sent[0].subject, "Relatório Semanal - Movimentado");
    assert!(sent[0].text.contains("Demorou"));
    assert!(sent[0].text.contains("Ótimo atendimento"));
}

#[tokio::test]
async fn a_failed_delivery_is_recorded_without_aborting_the_batch() {
    // arrange
    let app = spawn_app().await;
    let establishment = subscriber_with_establishment(&app, "Sem Email").await;
    app.add_feedback_at(establishment.id, Rating::Okay, None, Utc::now() - Duration::hours(5)).await;
    app.email_client.fail_deliveries();

    // act
    let response = app.cron_get("/cron/weekly-reports", Some(CRON_SECRET)).await;

    // assert
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["total"], 1);
    assert_eq!(body["errors"], 1);
    assert_eq!(body["results"][0]["status"], "failed");
    assert!(body["results"][0]["error"].is_string());
}

#[tokio::test]
async fn the_test_report_always_sends() {
    // arrange
    let app = spawn_app().await;
    let establishment = subscriber_with_establishment(&app, "Vazio").await;

    // act
    let response = app
        .api_client
        .post(app.url("/cron/test-weekly-report"))
        .bearer_auth(CRON_SECRET)
        .json(&json!({ "establishmentId": establishment.id }))
        .send()
        .await
        .unwrap();

    // assert
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["establishmentName"], "Vazio");
    assert_eq!(body["data"]["alertEmail"], establishment.alert_email.as_str());
    assert_eq!(body["data"]["report"]["total"], 0);
    let sent = app.email_client.sent_emails();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "[TESTE] Relatório Semanal - Vazio");
}

#[tokio::test]
async fn the_test_report_validates_its_input() {
    // arrange
    let app = spawn_app().await;
    let test_cases = vec![
        (json!({}), 400, "a missing id"),
        (json!({ "establishmentId": "not-a-uuid" }), 404, "a malformed id"),
        (
            json!({ "establishmentId": uuid::Uuid::new_v4() }),
            404,
            "an unknown id",
        ),
    ];

    for (body, expected_status, description) in test_cases {
        // act
        let response = app
            .api_client
            .post(app.url("/cron/test-weekly-report"))
            .bearer_auth(CRON_SECRET)
            .json(&body)
            .send()
            .await
            .unwrap();

        // assert
        assert_eq!(
            expected_status,
            response.status().as_u16(),
            "Unexpected status for {}.",
            description
        );
    }
}

#[tokio::test]
async fn the_test_email_endpoint_sends_the_fixed_message() {
    // arrange
    let app = spawn_app().await;

    // act
    let response = app.get("/test-email?to=dono@padaria.com").await;
    let missing = app.get("/test-email").await;

    // assert
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Email de teste enviado para dono@padaria.com");
    assert_eq!(400, missing.status().as_u16());
    let sent = app.email_client.sent_emails();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Teste de Email - Diz Aí");
}
