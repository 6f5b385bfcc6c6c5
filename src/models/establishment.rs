use crate::domain::{Establishment, EstablishmentChanges};
use crate::schema::establishments;
use chrono::{DateTime, Utc};
use diesel::{AsChangeset, Insertable, Queryable, Selectable};

#[derive(Queryable, Selectable)]
#[diesel(table_name = establishments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EstablishmentRow {
    pub id: uuid::Uuid,
    pub name: String,
    pub slug: String,
    pub alert_email: String,
    pub user_id: uuid::Uuid,
    pub google_review_url: Option<String>,
    pub show_google_review_prompt: bool,
    pub weekly_reports_enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl From<EstablishmentRow> for Establishment {
    fn from(row: EstablishmentRow) -> Self {
        Establishment {
            id: row.id,
            name: row.name,
            slug: row.slug,
            alert_email: row.alert_email,
            user_id: row.user_id,
            google_review_url: row.google_review_url,
            show_google_review_prompt: row.show_google_review_prompt,
            weekly_reports_enabled: row.weekly_reports_enabled,
            created_at: row.created_at,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = establishments)]
pub struct NewEstablishmentRow<'a> {
    pub id: &'a uuid::Uuid,
    pub name: &'a str,
    pub slug: &'a str,
    pub alert_email: &'a str,
    pub user_id: &'a uuid::Uuid,
    pub created_at: &'a DateTime<Utc>,
}

#[derive(AsChangeset)]
#[diesel(table_name = establishments)]
pub struct EstablishmentChangeset {
    pub name: Option<String>,
    pub alert_email: Option<String>,
    pub google_review_url: Option<Option<String>>,
    pub show_google_review_prompt: Option<bool>,
    pub weekly_reports_enabled: Option<bool>,
}

impl From<EstablishmentChanges> for EstablishmentChangeset {
    fn from(changes: EstablishmentChanges) -> Self {
        Self {
            name: changes.name.map(|n| n.as_ref().to_string()),
            alert_email: changes.alert_email.map(|e| e.as_ref().to_string()),
            google_review_url: changes.google_review_url,
            show_google_review_prompt: changes.show_google_review_prompt,
            weekly_reports_enabled: changes.weekly_reports_enabled,
        }
    }
}
