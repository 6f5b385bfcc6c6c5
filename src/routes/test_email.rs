use crate::domain::UserEmail;
use crate::email::{templates, Email};
use crate::routes::ApiError;
use anyhow::Context;
use rocket::serde::json::Json;
use rocket::State;
use std::sync::Arc;
use uuid::Uuid;

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct TestEmailSent {
    pub success: bool,
    pub message: String,
}

#[tracing::instrument(
    name = "Sending a test e-mail",
    skip(email_client),
    fields(request_id = %Uuid::new_v4())
)]
#[get("/test-email?<to>")]
pub async fn send_test_email(
    to: Option<String>,
    email_client: &State<Arc<dyn Email>>,
) -> Result<Json<TestEmailSent>, ApiError> {
    let to = to
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("Parâmetro 'to' é obrigatório".to_string()))?;
    let recipient = UserEmail::parse(to).map_err(ApiError::Validation)?;
    email_client
        .send_content(&recipient, &templates::test_email())
        .await
        .context("Failed to send the test e-mail.")?;
    Ok(Json(TestEmailSent {
        success: true,
        message: format!("Email de teste enviado para {}", recipient),
    }))
}
