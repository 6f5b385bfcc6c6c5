use crate::domain::{Establishment, NewFeedback, Rating, UserEmail};
use crate::email::{templates, Email};
use crate::routes::{non_blank, ApiError, ApplicationBaseUrl};
use crate::store::Store;
use anyhow::{anyhow, Context};
use rocket::serde::json::Json;
use rocket::State;
use std::sync::Arc;
use uuid::Uuid;

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackBody {
    rating: Option<String>,
    comment: Option<String>,
    establishment_slug: Option<String>,
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct FeedbackAccepted {
    pub success: bool,
    pub message: String,
}

#[tracing::instrument(
    name = "Receiving feedback",
    skip(body, store, email_client, base_url),
    fields(request_id = %Uuid::new_v4())
)]
#[post("/feedback", data = "<body>")]
pub async fn submit_feedback(
    body: Json<FeedbackBody>,
    store: &State<Arc<dyn Store>>,
    email_client: &State<Arc<dyn Email>>,
    base_url: &State<ApplicationBaseUrl>,
) -> Result<Json<FeedbackAccepted>, ApiError> {
    let body = body.into_inner();
    let (rating, slug) = match (non_blank(body.rating), non_blank(body.establishment_slug)) {
        (Some(rating), Some(slug)) => (rating, slug),
        _ => {
            return Err(ApiError::Validation(
                "Avaliação e estabelecimento são obrigatórios".to_string(),
            ))
        }
    };
    let rating: Rating = rating.parse().map_err(ApiError::Validation)?;

    let establishment = store
        .find_establishment_by_slug(&slug)
        .await
        .context("Failed to look up the establishment by slug.")?
        .ok_or_else(|| ApiError::NotFound("Estabelecimento não encontrado".to_string()))?;

    let feedback = store
        .insert_feedback(NewFeedback::new(rating, body.comment, establishment.id))
        .await
        .context("Failed to store the feedback.")?;

    if feedback.rating == Rating::Bad {
        if let Err(e) = send_negative_feedback_alert(
            email_client.inner().as_ref(),
            &establishment,
            feedback.comment_text(),
            &base_url.0,
        )
        .await
        {
            tracing::error!(
                error.cause_chain = ?e,
                establishment_id = %establishment.id,
                "Failed to send the negative feedback alert"
            );
        }
    }

    Ok(Json(FeedbackAccepted {
        success: true,
        message: "Feedback enviado com sucesso".to_string(),
    }))
}

#[tracing::instrument(
    name = "Sending a negative feedback alert",
    skip(email_client, establishment, comment, base_url),
    fields(establishment_id = %establishment.id)
)]
async fn send_negative_feedback_alert(
    email_client: &dyn Email,
    establishment: &Establishment,
    comment: Option<&str>,
    base_url: &str,
) -> Result<(), anyhow::Error> {
    let recipient = UserEmail::parse(establishment.alert_email.clone())
        .map_err(|e| anyhow!(e))
        .context("The alert e-mail on file is invalid.")?;
    let content = templates::negative_feedback_alert(&establishment.name, comment, base_url);
    email_client
        .send_content(&recipient, &content)
        .await
        .context("Failed to send the negative feedback alert.")
}
