use crate::billing::{BillingEvent, BillingGateway};
use crate::domain::{SubscriptionStatus, SubscriptionUpdate, User};
use crate::store::Store;
use anyhow::Context;
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Applied { user_id: Uuid },
    /// No local user could be tied to the event.
    Unresolved,
    /// The event needs no state change.
    Ignored,
}

/// Maps verified billing events onto the local subscription state.
pub struct Reconciler<'a> {
    pub store: &'a dyn Store,
    pub billing: &'a dyn BillingGateway,
}

impl<'a> Reconciler<'a> {
    /// Store and gateway failures are returned so the provider retries the delivery.
    #[tracing::instrument(name = "Reconciling billing event", skip(self))]
    pub async fn apply(
        &self,
        event: BillingEvent,
        now: DateTime<Utc>,
    ) -> Result<ReconcileOutcome, anyhow::Error> {
        match event {
            BillingEvent::CheckoutCompleted {
                metadata_user_id,
                customer_email,
                customer_id,
                subscription_id,
            } => {
                let user = self
                    .resolve_checkout(
                        metadata_user_id.as_deref(),
                        customer_email.as_deref(),
                        customer_id.as_deref(),
                    )
                    .await?;
                let Some(user) = user else {
                    return Ok(ReconcileOutcome::Unresolved);
                };
                let Some(subscription_id) = subscription_id else {
                    tracing::info!(user_id = %user.id, "Checkout completed without a subscription");
                    return Ok(ReconcileOutcome::Ignored);
                };
                self.update(
                    user.id,
                    SubscriptionUpdate {
                        status: Some(SubscriptionStatus::Active),
                        stripe_customer_id: customer_id,
                        stripe_subscription_id: Some(subscription_id),
                        end_date: None,
                    },
                )
                .await
            }
            BillingEvent::SubscriptionChanged {
                customer_id,
                subscription_id,
                status,
                current_period_end,
            } => {
                let status = match status.parse::<SubscriptionStatus>() {
                    Ok(status) => status,
                    Err(_) => {
                        tracing::warn!(%status, "Ignoring unknown subscription status");
                        return Ok(ReconcileOutcome::Ignored);
                    }
                };
                let Some(user) = self.resolve_customer(&customer_id).await? else {
                    return Ok(ReconcileOutcome::Unresolved);
                };
                self.update(
                    user.id,
                    SubscriptionUpdate {
                        status: Some(status),
                        stripe_customer_id: Some(customer_id),
                        stripe_subscription_id: Some(subscription_id),
                        end_date: current_period_end
                            .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
                    },
                )
                .await
            }
            BillingEvent::SubscriptionDeleted { customer_id } => {
                self.set_status(
                    Some(customer_id),
                    SubscriptionStatus::Canceled,
                    Some(now),
                )
                .await
            }
            BillingEvent::InvoicePaymentFailed { customer_id } => {
                self.set_status(customer_id, SubscriptionStatus::PastDue, None)
                    .await
            }
            BillingEvent::InvoicePaymentSucceeded { customer_id } => {
                self.set_status(customer_id, SubscriptionStatus::Active, None)
                    .await
            }
            BillingEvent::Unhandled(kind) => {
                tracing::info!(event_type = %kind, "Unhandled billing event");
                Ok(ReconcileOutcome::Ignored)
            }
        }
    }

    async fn set_status(
        &self,
        customer_id: Option<String>,
        status: SubscriptionStatus,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<ReconcileOutcome, anyhow::Error> {
        let Some(customer_id) = customer_id else {
            tracing::warn!("Billing event carries no customer id");
            return Ok(ReconcileOutcome::Unresolved);
        };
        let Some(user) = self.resolve_customer(&customer_id).await? else {
            return Ok(ReconcileOutcome::Unresolved);
        };
        self.update(
            user.id,
            SubscriptionUpdate {
                status: Some(status),
                end_date,
                ..Default::default()
            },
        )
        .await
    }

    async fn update(
        &self,
        user_id: Uuid,
        update: SubscriptionUpdate,
    ) -> Result<ReconcileOutcome, anyhow::Error> {
        let updated = self
            .store
            .update_user_subscription(user_id, update)
            .await
            .context("Failed to persist the subscription change.")?;
        Ok(match updated {
            Some(user) => {
                tracing::info!(
                    user_id = %user.id,
                    status = user.subscription_status.as_str(),
                    "Subscription updated"
                );
                ReconcileOutcome::Applied { user_id: user.id }
            }
            None => {
                tracing::warn!(%user_id, "User disappeared before the subscription change");
                ReconcileOutcome::Unresolved
            }
        })
    }

    /// Metadata tag, then checkout e-mail, then the stored customer id.
    async fn resolve_checkout(
        &self,
        metadata_user_id: Option<&str>,
        customer_email: Option<&str>,
        customer_id: Option<&str>,
    ) -> Result<Option<User>, anyhow::Error> {
        if let Some(user_id) = metadata_user_id.and_then(|id| Uuid::parse_str(id).ok()) {
            if let Some(user) = self
                .store
                .find_user_by_id(user_id)
                .await
                .context("Failed to look up the user tagged on the checkout.")?
            {
                return Ok(Some(user));
            }
        }
        if let Some(email) = customer_email {
            if let Some(user) = self
                .store
                .find_user_by_email(&email.trim().to_lowercase())
                .await
                .context("Failed to look up the user by checkout e-mail.")?
            {
                return Ok(Some(user));
            }
        }
        if let Some(customer_id) = customer_id {
            if let Some(user) = self
                .store
                .find_user_by_customer_id(customer_id)
                .await
                .context("Failed to look up the user by customer id.")?
            {
                return Ok(Some(user));
            }
        }
        tracing::warn!(
            ?metadata_user_id,
            ?customer_id,
            "No user matches the completed checkout"
        );
        Ok(None)
    }

    /// Stored customer id first, then the user tag on the provider's customer record.
    async fn resolve_customer(&self, customer_id: &str) -> Result<Option<User>, anyhow::Error> {
        if let Some(user) = self
            .store
            .find_user_by_customer_id(customer_id)
            .await
            .context("Failed to look up the user by customer id.")?
        {
            return Ok(Some(user));
        }
        let tagged = self
            .billing
            .customer_user_id(customer_id)
            .await
            .context("Failed to read the customer's user tag.")?;
        let user = match tagged {
            Some(user_id) => self
                .store
                .find_user_by_id(user_id)
                .await
                .context("Failed to look up the tagged user.")?,
            None => None,
        };
        if user.is_none() {
            tracing::warn!(customer_id, "No user matches the billing customer");
        }
        Ok(user)
    }
}
