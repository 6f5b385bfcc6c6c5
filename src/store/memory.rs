use crate::domain::{
    Establishment, EstablishmentChanges, Feedback, FeedbackFilter, NewEstablishment, NewFeedback,
    NewUser, SubscriptionStatus, SubscriptionUpdate, User,
};
use crate::store::Store;
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    establishments: Vec<Establishment>,
    feedbacks: Vec<Feedback>,
}

/// Process-local store with the same uniqueness rules as the Postgres schema.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<std::sync::MutexGuard<'_, Tables>, anyhow::Error> {
        self.tables
            .lock()
            .map_err(|_| anyhow!("The in-memory store lock was poisoned."))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, new_user: NewUser) -> Result<User, anyhow::Error> {
        let mut tables = self.tables()?;
        if tables
            .users
            .iter()
            .any(|u| u.email == new_user.email.as_ref())
        {
            return Err(anyhow!("A user with this email already exists."));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email.as_ref().to_string(),
            password_hash: new_user.password_hash,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            subscription_status: SubscriptionStatus::None,
            subscription_end_date: None,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, anyhow::Error> {
        let tables = self.tables()?;
        Ok(tables.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, anyhow::Error> {
        let tables = self.tables()?;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<User>, anyhow::Error> {
        let tables = self.tables()?;
        Ok(tables
            .users
            .iter()
            .find(|u| u.stripe_customer_id.as_deref() == Some(customer_id))
            .cloned())
    }

    async fn update_user_subscription(
        &self,
        user_id: Uuid,
        update: SubscriptionUpdate,
    ) -> Result<Option<User>, anyhow::Error> {
        let mut tables = self.tables()?;
        Ok(tables
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .map(|user| {
                update.apply_to(user);
                user.clone()
            }))
    }

    async fn insert_establishment(
        &self,
        new_establishment: NewEstablishment,
    ) -> Result<Establishment, anyhow::Error> {
        let mut tables = self.tables()?;
        if tables
            .establishments
            .iter()
            .any(|e| e.slug == new_establishment.slug)
        {
            return Err(anyhow!(
                "The slug {} is already taken.",
                new_establishment.slug
            ));
        }
        if !tables.users.iter().any(|u| u.id == new_establishment.user_id) {
            return Err(anyhow!("User {} does not exist.", new_establishment.user_id));
        }
        let establishment = Establishment {
            id: Uuid::new_v4(),
            name: new_establishment.name.as_ref().to_string(),
            slug: new_establishment.slug,
            alert_email: new_establishment.alert_email.as_ref().to_string(),
            user_id: new_establishment.user_id,
            google_review_url: None,
            show_google_review_prompt: false,
            weekly_reports_enabled: true,
            created_at: Utc::now(),
        };
        tables.establishments.push(establishment.clone());
        Ok(establishment)
    }

    async fn find_establishment_by_id(
        &self,
        establishment_id: Uuid,
    ) -> Result<Option<Establishment>, anyhow::Error> {
        let tables = self.tables()?;
        Ok(tables
            .establishments
            .iter()
            .find(|e| e.id == establishment_id)
            .cloned())
    }

    async fn find_establishment_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Establishment>, anyhow::Error> {
        let tables = self.tables()?;
        Ok(tables
            .establishments
            .iter()
            .find(|e| e.slug == slug)
            .cloned())
    }

    async fn list_establishments_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Establishment>, anyhow::Error> {
        let tables = self.tables()?;
        // insertion order is creation order
        Ok(tables
            .establishments
            .iter()
            .rev()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_establishments_for_weekly_report(
        &self,
    ) -> Result<Vec<Establishment>, anyhow::Error> {
        let tables = self.tables()?;
        Ok(tables
            .establishments
            .iter()
            .filter(|e| e.weekly_reports_enabled)
            .filter(|e| {
                tables
                    .users
                    .iter()
                    .find(|u| u.id == e.user_id)
                    .map_or(false, |owner| owner.subscription_status.receives_reports())
            })
            .cloned()
            .collect())
    }

    async fn update_establishment(
        &self,
        establishment_id: Uuid,
        changes: EstablishmentChanges,
    ) -> Result<Option<Establishment>, anyhow::Error> {
        let mut tables = self.tables()?;
        Ok(tables
            .establishments
            .iter_mut()
            .find(|e| e.id == establishment_id)
            .map(|establishment| {
                changes.apply_to(establishment);
                establishment.clone()
            }))
    }

    async fn insert_feedback(&self, new_feedback: NewFeedback) -> Result<Feedback, anyhow::Error> {
        let mut tables = self.tables()?;
        if !tables
            .establishments
            .iter()
            .any(|e| e.id == new_feedback.establishment_id)
        {
            return Err(anyhow!(
                "Establishment {} does not exist.",
                new_feedback.establishment_id
            ));
        }
        let feedback = Feedback {
            id: Uuid::new_v4(),
            rating: new_feedback.rating,
            comment: new_feedback.comment,
            establishment_id: new_feedback.establishment_id,
            created_at: new_feedback.received_at,
        };
        tables.feedbacks.push(feedback.clone());
        Ok(feedback)
    }

    async fn list_feedbacks(
        &self,
        establishment_id: Uuid,
        filter: FeedbackFilter,
    ) -> Result<Vec<Feedback>, anyhow::Error> {
        let tables = self.tables()?;
        let mut feedbacks: Vec<Feedback> = tables
            .feedbacks
            .iter()
            .filter(|f| f.establishment_id == establishment_id && filter.matches(f))
            .cloned()
            .collect();
        feedbacks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(feedbacks)
    }
}
