mod memory;
mod postgres;

use crate::domain::{
    Establishment, EstablishmentChanges, Feedback, FeedbackFilter, NewEstablishment, NewFeedback,
    NewUser, SubscriptionUpdate, User,
};
use async_trait::async_trait;
pub use memory::MemoryStore;
pub use postgres::PgStore;
use uuid::Uuid;

/// Persistence gateway for users, establishments and feedbacks.
///
/// Listings come back newest first.
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_user(&self, new_user: NewUser) -> Result<User, anyhow::Error>;

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, anyhow::Error>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, anyhow::Error>;

    async fn find_user_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<User>, anyhow::Error>;

    /// Returns `None` when no user has that id.
    async fn update_user_subscription(
        &self,
        user_id: Uuid,
        update: SubscriptionUpdate,
    ) -> Result<Option<User>, anyhow::Error>;

    async fn insert_establishment(
        &self,
        new_establishment: NewEstablishment,
    ) -> Result<Establishment, anyhow::Error>;

    async fn find_establishment_by_id(
        &self,
        establishment_id: Uuid,
    ) -> Result<Option<Establishment>, anyhow::Error>;

    async fn find_establishment_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Establishment>, anyhow::Error>;

    async fn list_establishments_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Establishment>, anyhow::Error>;

    /// Establishments with weekly reports switched on whose owner is in a
    /// reporting subscription state.
    async fn list_establishments_for_weekly_report(
        &self,
    ) -> Result<Vec<Establishment>, anyhow::Error>;

    async fn update_establishment(
        &self,
        establishment_id: Uuid,
        changes: EstablishmentChanges,
    ) -> Result<Option<Establishment>, anyhow::Error>;

    async fn insert_feedback(&self, new_feedback: NewFeedback) -> Result<Feedback, anyhow::Error>;

    async fn list_feedbacks(
        &self,
        establishment_id: Uuid,
        filter: FeedbackFilter,
    ) -> Result<Vec<Feedback>, anyhow::Error>;
}
