use crate::billing::{BillingGateway, ReconcileOutcome, Reconciler, WebhookVerifier};
use crate::domain::SubscriptionUpdate;
use crate::guards::{AuthenticatedUser, StripeSignature};
use crate::routes::ApiError;
use crate::store::Store;
use anyhow::Context;
use chrono::Utc;
use rocket::data::{Data, ToByteUnit};
use rocket::serde::json::Json;
use rocket::State;
use std::sync::Arc;
use uuid::Uuid;

#[derive(serde::Serialize, serde::Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: String,
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct PortalResponse {
    pub url: String,
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct WebhookReceived {
    pub received: bool,
}

#[tracing::instrument(
    name = "Starting a subscription checkout",
    skip(user, store, billing),
    fields(request_id = %Uuid::new_v4(), user_id = %user.user.id)
)]
#[post("/stripe/checkout")]
pub async fn create_checkout(
    user: AuthenticatedUser,
    store: &State<Arc<dyn Store>>,
    billing: &State<Arc<dyn BillingGateway>>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let user = user.user;
    let customer_id = match user.stripe_customer_id {
        Some(customer_id) => customer_id,
        None => {
            let customer_id = billing
                .create_customer(&user.email, user.id)
                .await
                .context("Failed to create the billing customer.")?;
            store
                .update_user_subscription(
                    user.id,
                    SubscriptionUpdate {
                        stripe_customer_id: Some(customer_id.clone()),
                        ..Default::default()
                    },
                )
                .await
                .context("Failed to store the billing customer id.")?;
            customer_id
        }
    };

    let session = billing
        .create_checkout_session(&customer_id, user.id)
        .await
        .context("Failed to create the checkout session.")?;
    Ok(Json(CheckoutResponse {
        session_id: session.id,
        url: session.url,
    }))
}

#[tracing::instrument(
    name = "Opening the billing portal",
    skip(user, billing),
    fields(request_id = %Uuid::new_v4(), user_id = %user.user.id)
)]
#[post("/stripe/portal")]
pub async fn create_portal(
    user: AuthenticatedUser,
    billing: &State<Arc<dyn BillingGateway>>,
) -> Result<Json<PortalResponse>, ApiError> {
    let customer_id = user
        .user
        .stripe_customer_id
        .ok_or_else(|| ApiError::NotFound("Nenhuma assinatura encontrada".to_string()))?;
    let url = billing
        .create_portal_session(&customer_id)
        .await
        .context("Failed to create the billing portal session.")?;
    Ok(Json(PortalResponse { url }))
}

#[tracing::instrument(
    name = "Handling a billing webhook",
    skip(signature, payload, verifier, store, billing),
    fields(request_id = %Uuid::new_v4())
)]
#[post("/stripe/webhook", data = "<payload>")]
pub async fn stripe_webhook(
    signature: StripeSignature,
    payload: Data<'_>,
    verifier: &State<WebhookVerifier>,
    store: &State<Arc<dyn Store>>,
    billing: &State<Arc<dyn BillingGateway>>,
) -> Result<Json<WebhookReceived>, ApiError> {
    let payload = payload
        .open(1.mebibytes())
        .into_bytes()
        .await
        .context("Failed to read the webhook payload.")?;
    if !payload.is_complete() {
        return Err(ApiError::Validation("Webhook inválido".to_string()));
    }

    let event = verifier
        .verify(&payload, &signature.0, Utc::now().timestamp())
        .map_err(|e| {
            tracing::warn!(error = %e, "Rejected a billing webhook");
            ApiError::Validation("Webhook inválido".to_string())
        })?;

    let reconciler = Reconciler {
        store: store.inner().as_ref(),
        billing: billing.inner().as_ref(),
    };
    match reconciler.apply(event, Utc::now()).await? {
        ReconcileOutcome::Applied { user_id } => {
            tracing::info!(%user_id, "Subscription state updated")
        }
        ReconcileOutcome::Unresolved => {
            tracing::warn!("Billing event could not be tied to a user")
        }
        ReconcileOutcome::Ignored => {}
    }
    Ok(Json(WebhookReceived { received: true }))
}
