use crate::guards::{into_outcome, managed, OrStatus};
use anyhow::anyhow;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::Request;
use secrecy::{ExposeSecret, Secret};
use subtle::ConstantTimeEq;

/// Shared secret the scheduler presents as `Authorization: Bearer <secret>`.
pub struct CronSecret(pub Secret<String>);

pub struct CronAuthorization;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CronAuthorization {
    type Error = anyhow::Error;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        into_outcome(request, from_request_result(request))
    }
}

fn from_request_result(request: &Request<'_>) -> Result<CronAuthorization, (Status, anyhow::Error)> {
    let secret = managed::<CronSecret>(request)?;
    let header_value = request
        .headers()
        .get_one("Authorization")
        .or_status(Status::Unauthorized, "The 'Authorization' header was missing.")?;
    let presented = header_value
        .strip_prefix("Bearer ")
        .or_status(Status::Unauthorized, "The authorization scheme was not 'Bearer'.")?;
    if bearer_matches(secret.0.expose_secret(), presented) {
        Ok(CronAuthorization)
    } else {
        Err((Status::Unauthorized, anyhow!("The bearer token did not match.")))
    }
}

/// An unset secret never matches.
fn bearer_matches(expected: &str, presented: &str) -> bool {
    !expected.is_empty()
        && expected.len() == presented.len()
        && bool::from(expected.as_bytes().ct_eq(presented.as_bytes()))
}
