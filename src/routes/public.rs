use crate::domain::Establishment;
use crate::routes::ApiError;
use crate::store::Store;
use anyhow::Context;
use rocket::serde::json::Json;
use rocket::State;
use std::sync::Arc;
use uuid::Uuid;

/// What the public feedback page may know about an establishment.
#[derive(serde::Serialize, serde::Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PublicEstablishment {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub google_review_url: Option<String>,
    pub show_google_review_prompt: bool,
}

impl From<Establishment> for PublicEstablishment {
    fn from(establishment: Establishment) -> Self {
        Self {
            id: establishment.id,
            name: establishment.name,
            slug: establishment.slug,
            google_review_url: establishment.google_review_url,
            show_google_review_prompt: establishment.show_google_review_prompt,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct PublicEstablishmentResponse {
    pub establishment: PublicEstablishment,
}

#[tracing::instrument(
    name = "Loading a public establishment page",
    skip(store),
    fields(request_id = %Uuid::new_v4())
)]
#[get("/public/establishment/<slug>")]
pub async fn public_establishment(
    slug: &str,
    store: &State<Arc<dyn Store>>,
) -> Result<Json<PublicEstablishmentResponse>, ApiError> {
    let establishment = store
        .find_establishment_by_slug(slug)
        .await
        .context("Failed to look up the establishment by slug.")?
        .ok_or_else(|| ApiError::NotFound("Estabelecimento não encontrado".to_string()))?;
    Ok(Json(PublicEstablishmentResponse {
        establishment: establishment.into(),
    }))
}
