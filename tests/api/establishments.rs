use crate::helpers::{assert_error_message, spawn_app};
use chrono::{Duration, Utc};
use dizai::domain::{Rating, SubscriptionStatus};
use serde_json::{json, Value};

#[tokio::test]
async fn creating_an_establishment_requires_an_active_subscription() {
    // arrange
    let app = spawn_app().await;
    app.register_user().await;

    // act
    let response = app
        .post_json("/establishments", &json!({ "name": "Padaria Pão Quente" }))
        .await;

    // assert
    assert_eq!(403, response.status().as_u16());
}

#[tokio::test]
async fn creating_an_establishment_requires_a_session() {
    // arrange
    let app = spawn_app().await;

    // act
    let response = app
        .post_json("/establishments", &json!({ "name": "Padaria Pão Quente" }))
        .await;

    // assert
    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn a_subscriber_can_create_an_establishment() {
    // arrange
    let app = spawn_app().await;
    let user = app.register_subscriber().await;

    // act
    let establishment = app.create_establishment("Padaria Pão Quente").await;

    // assert
    assert_eq!(establishment.name, "Padaria Pão Quente");
    assert!(establishment.slug.starts_with("padaria-pao-quente-"));
    assert_eq!(establishment.alert_email, user.email);
    assert_eq!(establishment.user_id, user.id);
    assert!(establishment.weekly_reports_enabled);
}

#[tokio::test]
async fn past_due_subscribers_keep_access() {
    // arrange
    let app = spawn_app().await;
    let user = app.register_user().await;
    app.set_subscription(user.id, SubscriptionStatus::PastDue)
        .await;

    // act
    let response = app
        .post_json(
            "/establishments",
            &json!({ "name": "Bar do Zé", "alertEmail": "alertas@bardoze.com" }),
        )
        .await;

    // assert
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["establishment"]["alert_email"], "alertas@bardoze.com");
}

#[tokio::test]
async fn creating_an_establishment_without_a_name_is_a_400() {
    // arrange
    let app = spawn_app().await;
    app.register_subscriber().await;

    for body in [json!({}), json!({ "name": "   " })] {
        // act
        let response = app.post_json("/establishments", &body).await;

        // assert
        assert_eq!(400, response.status().as_u16());
        let body: Value = response.json().await.unwrap();
        assert_error_message(&body, "Nome é obrigatório");
    }
}

#[tokio::test]
async fn establishments_are_listed_per_owner() {
    // arrange
    let app = spawn_app().await;
    app.register_subscriber().await;
    let first = app.create_establishment("Primeira").await;
    let second = app.create_establishment("Segunda").await;

    // act
    let body: Value = app.get("/establishments").await.json().await.unwrap();

    // assert
    let ids: Vec<_> = body["establishments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec![second.id.to_string(), first.id.to_string()]);

    app.post_json("/auth/logout", &json!({})).await;
    app.register_user().await;
    let body: Value = app.get("/establishments").await.json().await.unwrap();
    assert_eq!(body["establishments"], json!([]));
}

#[tokio::test]
async fn details_include_filtered_feedbacks_and_overall_stats() {
    // arrange
    let app = spawn_app().await;
    app.register_subscriber().await;
    let establishment = app.create_establishment("Café Central").await;
    let now = Utc::now();
    app.add_feedback_at(establishment.id, Rating::Great, None, now - Duration::hours(1)).await;
    app.add_feedback_at(establishment.id, Rating::Great, None, now - Duration::hours(2)).await;
    app.add_feedback_at(establishment.id, Rating::Bad, Some("frio"), now - Duration::hours(3)).await;
    app.add_feedback_at(establishment.id, Rating::Okay, None, now - Duration::days(10)).await;

    // act
    let all: Value = app
        .get(&format!("/establishments/{}", establishment.id))
        .await
        .json()
        .await
        .unwrap();
    let recent_bad: Value = app
        .get(&format!(
            "/establishments/{}?days=7&rating=bad",
            establishment.id
        ))
        .await
        .json()
        .await
        .unwrap();
    let last_week: Value = app
        .get(&format!("/establishments/{}?days=7", establishment.id))
        .await
        .json()
        .await
        .unwrap();

    // assert
    assert_eq!(all["feedbacks"].as_array().unwrap().len(), 4);
    assert_eq!(all["stats"], json!({ "total": 4, "happiness": 50, "issues": 1 }));
    assert_eq!(recent_bad["feedbacks"].as_array().unwrap().len(), 1);
    assert_eq!(recent_bad["feedbacks"][0]["comment"], "frio");
    assert_eq!(recent_bad["stats"]["total"], 4);
    assert_eq!(last_week["feedbacks"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn other_owners_cannot_see_an_establishment() {
    // arrange
    let app = spawn_app().await;
    app.register_subscriber().await;
    let establishment = app.create_establishment("Privado").await;
    app.post_json("/auth/logout", &json!({})).await;
    app.register_subscriber().await;

    // act
    let response = app
        .get(&format!("/establishments/{}", establishment.id))
        .await;

    // assert
    assert_eq!(403, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_error_message(&body, "Acesso negado");
}

#[tokio::test]
async fn unknown_or_malformed_ids_are_a_404() {
    // arrange
    let app = spawn_app().await;
    app.register_user().await;

    for id in [uuid::Uuid::new_v4().to_string(), "not-a-uuid".to_string()] {
        // act
        let response = app.get(&format!("/establishments/{}", id)).await;

        // assert
        assert_eq!(404, response.status().as_u16());
    }
}

#[tokio::test]
async fn settings_can_be_updated_by_the_owner() {
    // arrange
    let app = spawn_app().await;
    app.register_subscriber().await;
    let establishment = app.create_establishment("Antigo Nome").await;
    let path = format!("/establishments/{}", establishment.id);

    // act
    let response = app
        .put_json(
            &path,
            &json!({
                "name": "Novo Nome",
                "alertEmail": "",
                "googleReviewUrl": "https://g.page/r/novo/review",
                "showGoogleReviewPrompt": true,
                "weeklyReportsEnabled": false
            }),
        )
        .await;

    // assert
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    let updated = &body["establishment"];
    assert_eq!(updated["name"], "Novo Nome");
    assert_eq!(updated["alert_email"], establishment.alert_email);
    assert_eq!(updated["google_review_url"], "https://g.page/r/novo/review");
    assert_eq!(updated["show_google_review_prompt"], true);
    assert_eq!(updated["weekly_reports_enabled"], false);
    assert_eq!(updated["slug"], establishment.slug);

    let cleared: Value = app
        .put_json(&path, &json!({ "googleReviewUrl": null }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(cleared["establishment"]["google_review_url"], Value::Null);
    assert_eq!(cleared["establishment"]["name"], "Novo Nome");
}

#[tokio::test]
async fn invalid_settings_are_rejected() {
    // arrange
    let app = spawn_app().await;
    app.register_subscriber().await;
    let establishment = app.create_establishment("Loja").await;
    let path = format!("/establishments/{}", establishment.id);

    for body in [
        json!({ "alertEmail": "not-an-email" }),
        json!({ "googleReviewUrl": "ftp://example.com" }),
    ] {
        // act
        let response = app.put_json(&path, &body).await;

        // assert
        assert_eq!(400, response.status().as_u16(), "payload {} was accepted", body);
    }
}
