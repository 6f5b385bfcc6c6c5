use crate::authentication::{AuthTokens, AUTH_COOKIE};
use crate::domain::User;
use crate::guards::{into_outcome, managed, OrStatus};
use crate::store::Store;
use chrono::Utc;
use rocket::http::Status;
use rocket::outcome::try_outcome;
use rocket::request::{FromRequest, Outcome};
use rocket::Request;
use std::sync::Arc;

/// The owner behind a valid `auth_token` cookie.
pub struct AuthenticatedUser {
    pub user: User,
    // prevents construction outside of this module
    _private: (),
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = anyhow::Error;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        into_outcome(request, from_request_result(request).await)
    }
}

async fn from_request_result(request: &Request<'_>) -> Result<AuthenticatedUser, (Status, anyhow::Error)> {
    let token = request
        .cookies()
        .get(AUTH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .or_status(Status::Unauthorized, "The auth cookie was missing.")?;
    let tokens = managed::<AuthTokens>(request)?;
    let store = managed::<Arc<dyn Store>>(request)?;

    let user_id = tokens
        .verify(&token)
        .or_status(Status::Unauthorized, "The auth cookie did not verify.")?;
    let user = store
        .find_user_by_id(user_id)
        .await
        .or_status(Status::InternalServerError, "Failed to load the session user.")?
        .or_status(Status::Unauthorized, "The session user no longer exists.")?;

    Ok(AuthenticatedUser { user, _private: () })
}

/// An authenticated owner whose subscription currently grants access.
pub struct SubscribedUser {
    pub user: User,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for SubscribedUser {
    type Error = anyhow::Error;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let user = try_outcome!(request.guard::<AuthenticatedUser>().await).user;
        let result = if user.has_access(Utc::now()) {
            Ok(SubscribedUser { user })
        } else {
            Err((
                Status::Forbidden,
                anyhow::anyhow!("The subscription of user {} does not grant access.", user.id),
            ))
        };
        into_outcome(request, result)
    }
}
