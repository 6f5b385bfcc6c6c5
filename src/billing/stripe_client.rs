use crate::billing::{BillingGateway, CheckoutSession};
use crate::configuration::StripeSettings;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use std::collections::HashMap;
use uuid::Uuid;

pub struct StripeClient {
    http_client: reqwest::Client,
    api_base_url: String,
    secret_key: Secret<String>,
    price_id: String,
    app_base_url: String,
}

#[derive(serde::Deserialize)]
struct CreatedCustomer {
    id: String,
}

#[derive(serde::Deserialize)]
struct PortalSession {
    url: String,
}

#[derive(serde::Deserialize)]
struct RetrievedCustomer {
    #[serde(default)]
    deleted: bool,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

impl StripeClient {
    pub fn new(
        settings: &StripeSettings,
        app_base_url: String,
        timeout: std::time::Duration,
    ) -> Result<Self, anyhow::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build the billing HTTP client.")?;
        Ok(Self {
            http_client,
            api_base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            secret_key: settings.secret_key.clone(),
            price_id: settings.price_id.clone(),
            app_base_url: app_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn checkout_form(&self, customer_id: &str, user_id: Uuid) -> Vec<(&'static str, String)> {
        vec![
            ("customer", customer_id.to_string()),
            ("mode", "subscription".to_string()),
            ("payment_method_types[0]", "card".to_string()),
            ("line_items[0][price]", self.price_id.clone()),
            ("line_items[0][quantity]", "1".to_string()),
            (
                "success_url",
                format!("{}/dashboard?checkout=success", self.app_base_url),
            ),
            (
                "cancel_url",
                format!("{}/pricing?checkout=cancelled", self.app_base_url),
            ),
            ("metadata[userId]", user_id.to_string()),
        ]
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<T, anyhow::Error> {
        let response = self
            .http_client
            .post(format!("{}{}", self.api_base_url, path))
            .basic_auth(self.secret_key.expose_secret(), Option::<&str>::None)
            .form(form)
            .send()
            .await
            .with_context(|| format!("Failed to reach the billing API at {}.", path))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, error = %body, path, "Billing API call failed");
            return Err(anyhow!("The billing API answered {} for {}.", status, path));
        }
        response
            .json()
            .await
            .with_context(|| format!("Failed to decode the billing API response for {}.", path))
    }
}

#[async_trait]
impl BillingGateway for StripeClient {
    #[tracing::instrument(name = "Creating billing customer", skip(self, email))]
    async fn create_customer(&self, email: &str, user_id: Uuid) -> Result<String, anyhow::Error> {
        let form = [
            ("email", email.to_string()),
            ("metadata[userId]", user_id.to_string()),
        ];
        let customer: CreatedCustomer = self.post_form("/v1/customers", &form).await?;
        Ok(customer.id)
    }

    #[tracing::instrument(name = "Creating checkout session", skip(self))]
    async fn create_checkout_session(
        &self,
        customer_id: &str,
        user_id: Uuid,
    ) -> Result<CheckoutSession, anyhow::Error> {
        let form = self.checkout_form(customer_id, user_id);
        self.post_form("/v1/checkout/sessions", &form).await
    }

    #[tracing::instrument(name = "Creating billing portal session", skip(self))]
    async fn create_portal_session(&self, customer_id: &str) -> Result<String, anyhow::Error> {
        let form = [
            ("customer", customer_id.to_string()),
            ("return_url", format!("{}/dashboard", self.app_base_url)),
        ];
        let session: PortalSession = self.post_form("/v1/billing_portal/sessions", &form).await?;
        Ok(session.url)
    }

    #[tracing::instrument(name = "Looking up billing customer", skip(self))]
    async fn customer_user_id(&self, customer_id: &str) -> Result<Option<Uuid>, anyhow::Error> {
        let response = self
            .http_client
            .get(format!("{}/v1/customers/{}", self.api_base_url, customer_id))
            .basic_auth(self.secret_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .context("Failed to reach the billing API.")?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let customer: RetrievedCustomer = response
            .error_for_status()
            .context("The billing API rejected the customer lookup.")?
            .json()
            .await
            .context("Failed to decode the billing customer.")?;
        Ok(user_id_from_metadata(&customer))
    }
}

fn user_id_from_metadata(customer: &RetrievedCustomer) -> Option<Uuid> {
    if customer.deleted {
        return None;
    }
    customer
        .metadata
        .get("userId")
        .and_then(|id| Uuid::parse_str(id).ok())
}
