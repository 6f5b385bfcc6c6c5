mod authenticated_user;
mod cron_authorization;
mod stripe_signature;

use anyhow::{anyhow, Context};
pub use authenticated_user::{AuthenticatedUser, SubscribedUser};
pub use cron_authorization::{CronAuthorization, CronSecret};
use rocket::http::Status;
use rocket::request::Outcome;
use rocket::Request;
pub use stripe_signature::StripeSignature;

trait OrStatus<T> {
    fn or_status(self, status: Status, context: &'static str)
        -> Result<T, (Status, anyhow::Error)>;
}

impl<T, E> OrStatus<T> for Result<T, E>
where
    anyhow::Error: From<E>,
{
    fn or_status(
        self,
        status: Status,
        context: &'static str,
    ) -> Result<T, (Status, anyhow::Error)> {
        self.map_err(|e| (status, anyhow::Error::from(e).context(context)))
    }
}

impl<T> OrStatus<T> for Option<T> {
    fn or_status(
        self,
        status: Status,
        context: &'static str,
    ) -> Result<T, (Status, anyhow::Error)> {
        self.ok_or_else(|| (status, anyhow!(context)))
    }
}

/// Logs why a guard refused the request; catchers only see the status.
fn into_outcome<T>(request: &Request<'_>, result: Result<T, (Status, anyhow::Error)>) -> Outcome<T, anyhow::Error> {
    match result {
        Ok(value) => Outcome::Success(value),
        Err((status, error)) => {
            tracing::warn!(
                error.cause_chain = ?error,
                uri = %request.uri(),
                status = status.code,
                "Request guard refused the request"
            );
            Outcome::Error((status, error))
        }
    }
}

fn managed<'r, T: Send + Sync + 'static>(request: &'r Request<'_>) -> Result<&'r T, (Status, anyhow::Error)> {
    request
        .rocket()
        .state::<T>()
        .with_context(|| format!("{} is not managed.", std::any::type_name::<T>()))
        .map_err(|e| (Status::InternalServerError, e))
}
