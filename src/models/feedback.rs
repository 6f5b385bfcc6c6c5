use crate::domain::Feedback;
use crate::schema::feedbacks;
use chrono::{DateTime, Utc};
use diesel::{Insertable, Queryable, Selectable};

#[derive(Queryable, Selectable)]
#[diesel(table_name = feedbacks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FeedbackRow {
    pub id: uuid::Uuid,
    pub rating: String,
    pub comment: Option<String>,
    pub establishment_id: uuid::Uuid,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<FeedbackRow> for Feedback {
    type Error = anyhow::Error;

    fn try_from(row: FeedbackRow) -> Result<Self, Self::Error> {
        let rating = row.rating.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        Ok(Feedback {
            id: row.id,
            rating,
            comment: row.comment,
            establishment_id: row.establishment_id,
            created_at: row.created_at,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = feedbacks)]
pub struct NewFeedbackRow<'a> {
    pub id: &'a uuid::Uuid,
    pub rating: &'a str,
    pub comment: Option<&'a str>,
    pub establishment_id: &'a uuid::Uuid,
    pub created_at: &'a DateTime<Utc>,
}
