use crate::domain::{EstablishmentName, UserEmail};
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Establishment {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub alert_email: String,
    pub user_id: Uuid,
    pub google_review_url: Option<String>,
    pub show_google_review_prompt: bool,
    pub weekly_reports_enabled: bool,
    pub created_at: DateTime<Utc>,
}

pub struct NewEstablishment {
    pub name: EstablishmentName,
    pub slug: String,
    pub alert_email: UserEmail,
    pub user_id: Uuid,
}

/// Settings update. `google_review_url: Some(None)` clears the link.
#[derive(Debug, Clone, Default)]
pub struct EstablishmentChanges {
    pub name: Option<EstablishmentName>,
    pub alert_email: Option<UserEmail>,
    pub google_review_url: Option<Option<String>>,
    pub show_google_review_prompt: Option<bool>,
    pub weekly_reports_enabled: Option<bool>,
}

impl EstablishmentChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.alert_email.is_none()
            && self.google_review_url.is_none()
            && self.show_google_review_prompt.is_none()
            && self.weekly_reports_enabled.is_none()
    }

    pub fn apply_to(&self, establishment: &mut Establishment) {
        if let Some(name) = &self.name {
            establishment.name = name.as_ref().to_string();
        }
        if let Some(alert_email) = &self.alert_email {
            establishment.alert_email = alert_email.as_ref().to_string();
        }
        if let Some(google_review_url) = &self.google_review_url {
            establishment.google_review_url = google_review_url.clone();
        }
        if let Some(show) = self.show_google_review_prompt {
            establishment.show_google_review_prompt = show;
        }
        if let Some(enabled) = self.weekly_reports_enabled {
            establishment.weekly_reports_enabled = enabled;
        }
    }
}
