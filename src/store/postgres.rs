use crate::configuration::DatabaseSettings;
use crate::domain::{
    Establishment, EstablishmentChanges, Feedback, FeedbackFilter, NewEstablishment, NewFeedback,
    NewUser, SubscriptionStatus, SubscriptionUpdate, User,
};
use crate::models::*;
use crate::store::Store;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use secrecy::ExposeSecret;
use uuid::Uuid;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

type PgPool = Pool<ConnectionManager<PgConnection>>;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn connect(settings: &DatabaseSettings) -> Result<Self, anyhow::Error> {
        let manager =
            ConnectionManager::<PgConnection>::new(settings.connection_string().expose_secret());
        let pool = Pool::builder()
            .max_size(settings.max_connections)
            .build(manager)
            .context("Failed to build the Postgres connection pool.")?;
        Ok(Self { pool })
    }

    #[tracing::instrument(name = "Running pending migrations", skip(self))]
    pub fn run_migrations(&self) -> Result<(), anyhow::Error> {
        let mut conn = self
            .pool
            .get()
            .context("Failed to retrieve a connection from the DB pool.")?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow!(e))
            .context("Failed to apply pending migrations.")?;
        Ok(())
    }

    /// Diesel is blocking, so every query runs on the blocking thread pool.
    async fn run<F, T>(&self, query: F) -> Result<T, anyhow::Error>
    where
        F: FnOnce(&mut PgConnection) -> Result<T, anyhow::Error> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .context("Failed to retrieve a connection from the DB pool.")?;
            query(&mut conn)
        })
        .await
        .context("The database task panicked.")?
    }
}

fn into_users(rows: Vec<UserRow>) -> Result<Option<User>, anyhow::Error> {
    rows.into_iter().next().map(User::try_from).transpose()
}

fn into_establishment(row: Option<EstablishmentRow>) -> Option<Establishment> {
    row.map(Establishment::from)
}

#[async_trait]
impl Store for PgStore {
    #[tracing::instrument(name = "Saving new user in the database", skip(self, new_user))]
    async fn insert_user(&self, new_user: NewUser) -> Result<User, anyhow::Error> {
        self.run(move |conn| {
            use crate::schema::users;
            let row: UserRow = diesel::insert_into(users::table)
                .values(NewUserRow {
                    id: &Uuid::new_v4(),
                    email: new_user.email.as_ref(),
                    password_hash: new_user.password_hash.expose_secret(),
                    subscription_status: SubscriptionStatus::None.as_str(),
                    created_at: &Utc::now(),
                })
                .returning(UserRow::as_returning())
                .get_result(conn)
                .context("Failed to insert the new user.")?;
            User::try_from(row)
        })
        .await
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, anyhow::Error> {
        self.run(move |conn| {
            use crate::schema::users;
            let rows: Vec<UserRow> = users::table
                .filter(users::id.eq(user_id))
                .select(UserRow::as_select())
                .limit(1)
                .load(conn)
                .context("Failed to look up a user by id.")?;
            into_users(rows)
        })
        .await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, anyhow::Error> {
        let email = email.to_string();
        self.run(move |conn| {
            use crate::schema::users;
            let rows: Vec<UserRow> = users::table
                .filter(users::email.eq(email))
                .select(UserRow::as_select())
                .limit(1)
                .load(conn)
                .context("Failed to look up a user by email.")?;
            into_users(rows)
        })
        .await
    }

    async fn find_user_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<User>, anyhow::Error> {
        let customer_id = customer_id.to_string();
        self.run(move |conn| {
            use crate::schema::users;
            let rows: Vec<UserRow> = users::table
                .filter(users::stripe_customer_id.eq(customer_id))
                .select(UserRow::as_select())
                .limit(1)
                .load(conn)
                .context("Failed to look up a user by billing customer id.")?;
            into_users(rows)
        })
        .await
    }

    #[tracing::instrument(name = "Updating user subscription", skip(self))]
    async fn update_user_subscription(
        &self,
        user_id: Uuid,
        update: SubscriptionUpdate,
    ) -> Result<Option<User>, anyhow::Error> {
        if update.is_empty() {
            return self.find_user_by_id(user_id).await;
        }
        self.run(move |conn| {
            use crate::schema::users;
            let row: Option<UserRow> = diesel::update(users::table.filter(users::id.eq(user_id)))
                .set(SubscriptionChangeset::from(update))
                .returning(UserRow::as_returning())
                .get_result(conn)
                .optional()
                .context("Failed to update the user's subscription.")?;
            row.map(User::try_from).transpose()
        })
        .await
    }

    #[tracing::instrument(
        name = "Saving new establishment in the database",
        skip(self, new_establishment),
        fields(slug = %new_establishment.slug)
    )]
    async fn insert_establishment(
        &self,
        new_establishment: NewEstablishment,
    ) -> Result<Establishment, anyhow::Error> {
        self.run(move |conn| {
            use crate::schema::establishments;
            let row: EstablishmentRow = diesel::insert_into(establishments::table)
                .values(NewEstablishmentRow {
                    id: &Uuid::new_v4(),
                    name: new_establishment.name.as_ref(),
                    slug: &new_establishment.slug,
                    alert_email: new_establishment.alert_email.as_ref(),
                    user_id: &new_establishment.user_id,
                    created_at: &Utc::now(),
                })
                .returning(EstablishmentRow::as_returning())
                .get_result(conn)
                .context("Failed to insert the new establishment.")?;
            Ok(Establishment::from(row))
        })
        .await
    }

    async fn find_establishment_by_id(
        &self,
        establishment_id: Uuid,
    ) -> Result<Option<Establishment>, anyhow::Error> {
        self.run(move |conn| {
            use crate::schema::establishments;
            let row: Option<EstablishmentRow> = establishments::table
                .filter(establishments::id.eq(establishment_id))
                .select(EstablishmentRow::as_select())
                .first(conn)
                .optional()
                .context("Failed to look up an establishment by id.")?;
            Ok(into_establishment(row))
        })
        .await
    }

    async fn find_establishment_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Establishment>, anyhow::Error> {
        let slug = slug.to_string();
        self.run(move |conn| {
            use crate::schema::establishments;
            let row: Option<EstablishmentRow> = establishments::table
                .filter(establishments::slug.eq(slug))
                .select(EstablishmentRow::as_select())
                .first(conn)
                .optional()
                .context("Failed to look up an establishment by slug.")?;
            Ok(into_establishment(row))
        })
        .await
    }

    async fn list_establishments_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Establishment>, anyhow::Error> {
        self.run(move |conn| {
            use crate::schema::establishments;
            let rows: Vec<EstablishmentRow> = establishments::table
                .filter(establishments::user_id.eq(user_id))
                .order(establishments::created_at.desc())
                .select(EstablishmentRow::as_select())
                .load(conn)
                .context("Failed to list the user's establishments.")?;
            Ok(rows.into_iter().map(Establishment::from).collect())
        })
        .await
    }

    #[tracing::instrument(name = "Get establishments due a weekly report", skip(self))]
    async fn list_establishments_for_weekly_report(
        &self,
    ) -> Result<Vec<Establishment>, anyhow::Error> {
        self.run(move |conn| {
            use crate::schema::{establishments, users};
            let reporting_statuses = [
                SubscriptionStatus::Active.as_str(),
                SubscriptionStatus::Trialing.as_str(),
            ];
            let rows: Vec<EstablishmentRow> = establishments::table
                .inner_join(users::table)
                .filter(establishments::weekly_reports_enabled.eq(true))
                .filter(users::subscription_status.eq_any(reporting_statuses))
                .order(establishments::created_at.asc())
                .select(EstablishmentRow::as_select())
                .load(conn)
                .context("Failed to list establishments due a weekly report.")?;
            Ok(rows.into_iter().map(Establishment::from).collect())
        })
        .await
    }

    #[tracing::instrument(name = "Updating establishment settings", skip(self, changes))]
    async fn update_establishment(
        &self,
        establishment_id: Uuid,
        changes: EstablishmentChanges,
    ) -> Result<Option<Establishment>, anyhow::Error> {
        if changes.is_empty() {
            return self.find_establishment_by_id(establishment_id).await;
        }
        self.run(move |conn| {
            use crate::schema::establishments;
            let row: Option<EstablishmentRow> = diesel::update(
                establishments::table.filter(establishments::id.eq(establishment_id)),
            )
            .set(EstablishmentChangeset::from(changes))
            .returning(EstablishmentRow::as_returning())
            .get_result(conn)
            .optional()
            .context("Failed to update the establishment.")?;
            Ok(into_establishment(row))
        })
        .await
    }

    #[tracing::instrument(name = "Saving new feedback in the database", skip(self, new_feedback))]
    async fn insert_feedback(&self, new_feedback: NewFeedback) -> Result<Feedback, anyhow::Error> {
        self.run(move |conn| {
            use crate::schema::feedbacks;
            let row: FeedbackRow = diesel::insert_into(feedbacks::table)
                .values(NewFeedbackRow {
                    id: &Uuid::new_v4(),
                    rating: new_feedback.rating.as_str(),
                    comment: new_feedback.comment.as_deref(),
                    establishment_id: &new_feedback.establishment_id,
                    created_at: &new_feedback.received_at,
                })
                .returning(FeedbackRow::as_returning())
                .get_result(conn)
                .context("Failed to insert the new feedback.")?;
            Feedback::try_from(row)
        })
        .await
    }

    async fn list_feedbacks(
        &self,
        establishment_id: Uuid,
        filter: FeedbackFilter,
    ) -> Result<Vec<Feedback>, anyhow::Error> {
        self.run(move |conn| {
            use crate::schema::feedbacks;
            let mut query = feedbacks::table
                .filter(feedbacks::establishment_id.eq(establishment_id))
                .select(FeedbackRow::as_select())
                .into_boxed();
            if let Some(since) = filter.since {
                query = query.filter(feedbacks::created_at.ge(since));
            }
            if let Some(until) = filter.until {
                query = query.filter(feedbacks::created_at.lt(until));
            }
            if let Some(rating) = filter.rating {
                query = query.filter(feedbacks::rating.eq(rating.as_str()));
            }
            let rows: Vec<FeedbackRow> = query
                .order(feedbacks::created_at.desc())
                .load(conn)
                .context("Failed to list feedbacks.")?;
            rows.into_iter().map(Feedback::try_from).collect()
        })
        .await
    }
}
