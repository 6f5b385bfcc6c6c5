use crate::domain::{
    generate_slug, Establishment, EstablishmentChanges, EstablishmentName, Feedback,
    FeedbackFilter, NewEstablishment, Rating, User, UserEmail,
};
use crate::guards::{AuthenticatedUser, SubscribedUser};
use crate::reports::weekly::RatingCounts;
use crate::routes::{deserialize_some, non_blank, ApiError};
use crate::store::Store;
use anyhow::{anyhow, Context};
use chrono::{Duration, Utc};
use rocket::serde::json::Json;
use rocket::State;
use std::sync::Arc;
use uuid::Uuid;

const MAX_SLUG_ATTEMPTS: usize = 10;
const MAX_FILTER_DAYS: i64 = 3650;

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct EstablishmentList {
    pub establishments: Vec<Establishment>,
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct EstablishmentResponse {
    pub establishment: Establishment,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq, Eq)]
pub struct FeedbackStats {
    pub total: usize,
    pub happiness: u32,
    pub issues: usize,
}

impl FeedbackStats {
    fn of(feedbacks: &[Feedback]) -> Self {
        let counts = RatingCounts::tally(feedbacks);
        Self {
            total: counts.total(),
            happiness: counts.happiness(),
            issues: counts.bad,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct EstablishmentDetails {
    pub establishment: Establishment,
    pub feedbacks: Vec<Feedback>,
    pub stats: FeedbackStats,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEstablishmentBody {
    name: Option<String>,
    alert_email: Option<String>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEstablishmentBody {
    name: Option<String>,
    alert_email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    google_review_url: Option<Option<String>>,
    show_google_review_prompt: Option<bool>,
    weekly_reports_enabled: Option<bool>,
}

impl TryFrom<UpdateEstablishmentBody> for EstablishmentChanges {
    type Error = String;

    fn try_from(body: UpdateEstablishmentBody) -> Result<Self, Self::Error> {
        let name = non_blank(body.name)
            .map(EstablishmentName::parse)
            .transpose()?;
        let alert_email = non_blank(body.alert_email)
            .map(UserEmail::parse)
            .transpose()?;
        let google_review_url = body
            .google_review_url
            .map(|url| non_blank(url).map(parse_review_url).transpose())
            .transpose()?;
        Ok(EstablishmentChanges {
            name,
            alert_email,
            google_review_url,
            show_google_review_prompt: body.show_google_review_prompt,
            weekly_reports_enabled: body.weekly_reports_enabled,
        })
    }
}

fn parse_review_url(url: String) -> Result<String, String> {
    let url = url.trim();
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(url.to_string())
    } else {
        Err("URL de avaliação inválida".to_string())
    }
}

#[tracing::instrument(
    name = "Listing establishments",
    skip(user, store),
    fields(request_id = %Uuid::new_v4(), user_id = %user.user.id)
)]
#[get("/establishments")]
pub async fn list_establishments(
    user: AuthenticatedUser,
    store: &State<Arc<dyn Store>>,
) -> Result<Json<EstablishmentList>, ApiError> {
    let establishments = store
        .list_establishments_for_user(user.user.id)
        .await
        .context("Failed to list the user's establishments.")?;
    Ok(Json(EstablishmentList { establishments }))
}

#[tracing::instrument(
    name = "Creating an establishment",
    skip(user, body, store),
    fields(request_id = %Uuid::new_v4(), user_id = %user.user.id)
)]
#[post("/establishments", data = "<body>")]
pub async fn create_establishment(
    user: SubscribedUser,
    body: Json<CreateEstablishmentBody>,
    store: &State<Arc<dyn Store>>,
) -> Result<Json<EstablishmentResponse>, ApiError> {
    let body = body.into_inner();
    let name = EstablishmentName::parse(body.name.unwrap_or_default())
        .map_err(ApiError::Validation)?;
    let alert_email = match non_blank(body.alert_email) {
        Some(email) => UserEmail::parse(email).map_err(ApiError::Validation)?,
        None => UserEmail::parse(user.user.email.clone())
            .map_err(|e| anyhow!(e))
            .context("The stored user e-mail is invalid.")?,
    };

    let slug = unused_slug(store.inner().as_ref(), &name).await?;
    let establishment = store
        .insert_establishment(NewEstablishment {
            name,
            slug,
            alert_email,
            user_id: user.user.id,
        })
        .await
        .context("Failed to store the new establishment.")?;
    Ok(Json(EstablishmentResponse { establishment }))
}

#[tracing::instrument(
    name = "Loading establishment details",
    skip(user, store),
    fields(request_id = %Uuid::new_v4(), user_id = %user.user.id)
)]
#[get("/establishments/<id>?<days>&<rating>")]
pub async fn get_establishment(
    id: &str,
    days: Option<i64>,
    rating: Option<&str>,
    user: AuthenticatedUser,
    store: &State<Arc<dyn Store>>,
) -> Result<Json<EstablishmentDetails>, ApiError> {
    let establishment = owned_establishment(store.inner().as_ref(), id, &user.user).await?;

    let rating = rating
        .filter(|r| !r.is_empty())
        .map(str::parse::<Rating>)
        .transpose()
        .map_err(ApiError::Validation)?;
    let filter = FeedbackFilter {
        since: days
            .filter(|d| *d > 0)
            .map(|d| Utc::now() - Duration::days(d.min(MAX_FILTER_DAYS))),
        until: None,
        rating,
    };

    let feedbacks = store
        .list_feedbacks(establishment.id, filter)
        .await
        .context("Failed to list filtered feedbacks.")?;
    let all_feedbacks = store
        .list_feedbacks(establishment.id, FeedbackFilter::default())
        .await
        .context("Failed to list feedbacks for the stats.")?;

    Ok(Json(EstablishmentDetails {
        establishment,
        feedbacks,
        stats: FeedbackStats::of(&all_feedbacks),
    }))
}

#[tracing::instrument(
    name = "Updating establishment settings",
    skip(user, body, store),
    fields(request_id = %Uuid::new_v4(), user_id = %user.user.id)
)]
#[put("/establishments/<id>", data = "<body>")]
pub async fn update_establishment(
    id: &str,
    user: AuthenticatedUser,
    body: Json<UpdateEstablishmentBody>,
    store: &State<Arc<dyn Store>>,
) -> Result<Json<EstablishmentResponse>, ApiError> {
    let establishment = owned_establishment(store.inner().as_ref(), id, &user.user).await?;
    let changes: EstablishmentChanges = body
        .into_inner()
        .try_into()
        .map_err(ApiError::Validation)?;
    if changes.is_empty() {
        return Ok(Json(EstablishmentResponse { establishment }));
    }

    let establishment = store
        .update_establishment(establishment.id, changes)
        .await
        .context("Failed to update the establishment.")?
        .ok_or_else(not_found)?;
    Ok(Json(EstablishmentResponse { establishment }))
}

/// Loads an establishment and checks it belongs to `user`.
async fn owned_establishment(
    store: &dyn Store,
    id: &str,
    user: &User,
) -> Result<Establishment, ApiError> {
    let id = Uuid::parse_str(id).map_err(|_| not_found())?;
    let establishment = store
        .find_establishment_by_id(id)
        .await
        .context("Failed to load the establishment.")?
        .ok_or_else(not_found)?;
    if establishment.user_id != user.id {
        return Err(ApiError::Forbidden("Acesso negado".to_string()));
    }
    Ok(establishment)
}

fn not_found() -> ApiError {
    ApiError::NotFound("Estabelecimento não encontrado".to_string())
}

#[tracing::instrument(name = "Picking an unused slug", skip(store, name))]
async fn unused_slug(store: &dyn Store, name: &EstablishmentName) -> Result<String, anyhow::Error> {
    for _ in 0..MAX_SLUG_ATTEMPTS {
        let slug = generate_slug(name.as_ref(), &mut rand::thread_rng());
        if store
            .find_establishment_by_slug(&slug)
            .await
            .context("Failed to check whether a slug is taken.")?
            .is_none()
        {
            return Ok(slug);
        }
    }
    Err(anyhow!(
        "No unused slug found after {} attempts.",
        MAX_SLUG_ATTEMPTS
    ))
}
