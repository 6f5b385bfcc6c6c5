mod reconciler;
mod stripe_client;
mod webhook;

use async_trait::async_trait;
pub use reconciler::{ReconcileOutcome, Reconciler};
pub use stripe_client::StripeClient;
use uuid::Uuid;
pub use webhook::{BillingEvent, SignatureHeader, WebhookError, WebhookVerifier};

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Hosted billing provider operations the service depends on.
#[async_trait]
pub trait BillingGateway: Send + Sync {
    /// Creates a customer tagged with the owning user's id and returns its id.
    async fn create_customer(&self, email: &str, user_id: Uuid) -> Result<String, anyhow::Error>;

    async fn create_checkout_session(
        &self,
        customer_id: &str,
        user_id: Uuid,
    ) -> Result<CheckoutSession, anyhow::Error>;

    /// Returns the URL of a self-service billing portal session.
    async fn create_portal_session(&self, customer_id: &str) -> Result<String, anyhow::Error>;

    /// Reads the user id tag back from a customer. `None` for deleted or untagged customers.
    async fn customer_user_id(&self, customer_id: &str) -> Result<Option<Uuid>, anyhow::Error>;
}
