use crate::domain::Rating;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Feedback {
    pub id: Uuid,
    pub rating: Rating,
    pub comment: Option<String>,
    pub establishment_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Feedback {
    /// The comment, if it has any visible text.
    pub fn comment_text(&self) -> Option<&str> {
        self.comment
            .as_deref()
            .map(str::trim)
            .filter(|comment| !comment.is_empty())
    }
}

pub struct NewFeedback {
    pub rating: Rating,
    pub comment: Option<String>,
    pub establishment_id: Uuid,
    pub received_at: DateTime<Utc>,
}

impl NewFeedback {
    pub fn new(rating: Rating, comment: Option<String>, establishment_id: Uuid) -> Self {
        let comment = comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        Self {
            rating,
            comment,
            establishment_id,
            received_at: Utc::now(),
        }
    }

    /// Overrides the receipt time, e.g. for feedback collected offline.
    pub fn received_at(mut self, received_at: DateTime<Utc>) -> Self {
        self.received_at = received_at;
        self
    }
}

/// `since` is inclusive, `until` exclusive.
#[derive(Debug, Clone, Default)]
pub struct FeedbackFilter {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub rating: Option<Rating>,
}

impl FeedbackFilter {
    pub fn between(since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self {
            since: Some(since),
            until: Some(until),
            rating: None,
        }
    }

    pub fn matches(&self, feedback: &Feedback) -> bool {
        self.since.map_or(true, |since| feedback.created_at >= since)
            && self.until.map_or(true, |until| feedback.created_at < until)
            && self.rating.map_or(true, |rating| feedback.rating == rating)
    }
}
