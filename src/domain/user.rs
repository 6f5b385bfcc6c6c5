use crate::domain::{SubscriptionStatus, UserEmail};
use chrono::{DateTime, Utc};
use secrecy::Secret;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Secret<String>,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub subscription_status: SubscriptionStatus,
    pub subscription_end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn has_access(&self, now: DateTime<Utc>) -> bool {
        self.subscription_status
            .grants_access(self.subscription_end_date, now)
    }
}

pub struct NewUser {
    pub email: UserEmail,
    pub password_hash: Secret<String>,
}

/// Partial update of a user's billing fields. `None` leaves a column as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionUpdate {
    pub status: Option<SubscriptionStatus>,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub end_date: Option<DateTime<Utc>>,
}

impl SubscriptionUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.stripe_customer_id.is_none()
            && self.stripe_subscription_id.is_none()
            && self.end_date.is_none()
    }

    pub fn apply_to(&self, user: &mut User) {
        if let Some(status) = self.status {
            user.subscription_status = status;
        }
        if let Some(customer_id) = &self.stripe_customer_id {
            user.stripe_customer_id = Some(customer_id.clone());
        }
        if let Some(subscription_id) = &self.stripe_subscription_id {
            user.stripe_subscription_id = Some(subscription_id.clone());
        }
        if let Some(end_date) = self.end_date {
            user.subscription_end_date = Some(end_date);
        }
    }
}
