use crate::domain::{SubscriptionUpdate, User};
use crate::schema::users;
use chrono::{DateTime, Utc};
use diesel::{AsChangeset, Insertable, Queryable, Selectable};
use secrecy::Secret;

#[derive(Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: uuid::Uuid,
    pub email: String,
    pub password_hash: String,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub subscription_status: String,
    pub subscription_end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let subscription_status = row
            .subscription_status
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))?;
        Ok(User {
            id: row.id,
            email: row.email,
            password_hash: Secret::new(row.password_hash),
            stripe_customer_id: row.stripe_customer_id,
            stripe_subscription_id: row.stripe_subscription_id,
            subscription_status,
            subscription_end_date: row.subscription_end_date,
            created_at: row.created_at,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow<'a> {
    pub id: &'a uuid::Uuid,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub subscription_status: &'a str,
    pub created_at: &'a DateTime<Utc>,
}

#[derive(AsChangeset)]
#[diesel(table_name = users)]
pub struct SubscriptionChangeset {
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub subscription_status: Option<String>,
    pub subscription_end_date: Option<DateTime<Utc>>,
}

impl From<SubscriptionUpdate> for SubscriptionChangeset {
    fn from(update: SubscriptionUpdate) -> Self {
        Self {
            stripe_customer_id: update.stripe_customer_id,
            stripe_subscription_id: update.stripe_subscription_id,
            subscription_status: update.status.map(|s| s.as_str().to_string()),
            subscription_end_date: update.end_date,
        }
    }
}
