mod auth;
mod cron;
mod establishments;
mod feedback;
mod health_check;
mod public;
mod stripe;
mod test_email;

pub use auth::*;
pub use cron::*;
pub use establishments::*;
pub use feedback::*;
pub use health_check::*;
pub use public::*;
pub use stripe::*;
pub use test_email::*;

use crate::catchers::json_error;
use rocket::http::Status;
use rocket::response::Responder;
use rocket::Request;

/// Base URL the app is reachable at, used in links sent to owners.
pub struct ApplicationBaseUrl(pub String);

pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

#[derive(thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> rocket::response::Result<'static> {
        tracing::warn!("ApiError: {:?}", self);
        let (status, message) = match self {
            ApiError::Validation(message) => (Status::BadRequest, message),
            ApiError::Unauthorized(message) => (Status::Unauthorized, message),
            ApiError::Forbidden(message) => (Status::Forbidden, message),
            ApiError::NotFound(message) => (Status::NotFound, message),
            ApiError::UnexpectedError(_) => (
                Status::InternalServerError,
                "Erro interno do servidor".to_string(),
            ),
        };
        json_error(status, message).respond_to(request)
    }
}

/// Lets a JSON body tell "absent" apart from an explicit `null`.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Treats blank strings like missing fields.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
