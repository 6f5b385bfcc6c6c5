use crate::authentication::{
    compute_password_hash, validate_credentials, AuthError, AuthTokens, Credentials,
};
use crate::domain::{NewPassword, NewUser, SubscriptionStatus, User, UserEmail};
use crate::guards::AuthenticatedUser;
use crate::routes::ApiError;
use crate::store::Store;
use anyhow::Context;
use chrono::{DateTime, Utc};
use rocket::http::CookieJar;
use rocket::serde::json::Json;
use rocket::State;
use secrecy::Secret;
use std::sync::Arc;
use uuid::Uuid;

#[derive(serde::Deserialize)]
pub struct CredentialsBody {
    email: Option<String>,
    password: Option<String>,
}

impl CredentialsBody {
    fn into_parts(self) -> Result<(String, String), ApiError> {
        match (self.email, self.password) {
            (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
                Ok((email, password))
            }
            _ => Err(ApiError::Validation(
                "Email e senha são obrigatórios".to_string(),
            )),
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct SessionResponse {
    pub user: SessionUser,
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub subscription_status: SubscriptionStatus,
    pub subscription_end_date: Option<DateTime<Utc>>,
    pub stripe_customer_id: Option<String>,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            subscription_status: user.subscription_status,
            subscription_end_date: user.subscription_end_date,
            stripe_customer_id: user.stripe_customer_id,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct CurrentUserResponse {
    pub user: CurrentUser,
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct SuccessResponse {
    pub success: bool,
}

#[tracing::instrument(
    name = "Registering a new user",
    skip(body, store, tokens, jar),
    fields(request_id = %Uuid::new_v4())
)]
#[post("/auth/register", data = "<body>")]
pub async fn register(
    body: Json<CredentialsBody>,
    store: &State<Arc<dyn Store>>,
    tokens: &State<AuthTokens>,
    jar: &CookieJar<'_>,
) -> Result<Json<SessionResponse>, ApiError> {
    let (email, password) = body.into_inner().into_parts()?;
    let email = UserEmail::parse(email).map_err(ApiError::Validation)?;
    let password = NewPassword::parse(password).map_err(ApiError::Validation)?;

    if store
        .find_user_by_email(email.as_ref())
        .await
        .context("Failed to look up the e-mail being registered.")?
        .is_some()
    {
        return Err(ApiError::Validation("Email já cadastrado".to_string()));
    }

    let password_hash = compute_password_hash(password.as_ref().clone()).await?;
    let user = store
        .insert_user(NewUser {
            email,
            password_hash,
        })
        .await
        .context("Failed to store the new user.")?;

    start_session(tokens, jar, user)
}

#[tracing::instrument(
    name = "Logging in",
    skip(body, store, tokens, jar),
    fields(request_id = %Uuid::new_v4(), user_id = tracing::field::Empty)
)]
#[post("/auth/login", data = "<body>")]
pub async fn login(
    body: Json<CredentialsBody>,
    store: &State<Arc<dyn Store>>,
    tokens: &State<AuthTokens>,
    jar: &CookieJar<'_>,
) -> Result<Json<SessionResponse>, ApiError> {
    let (email, password) = body.into_inner().into_parts()?;
    let credentials = Credentials {
        email,
        password: Secret::new(password),
    };
    let user_id = validate_credentials(credentials, store.inner().as_ref())
        .await
        .map_err(|e| match e {
            AuthError::InvalidCredentials(_) => {
                ApiError::Unauthorized("Email ou senha inválidos".to_string())
            }
            AuthError::UnexpectedError(e) => ApiError::UnexpectedError(e),
        })?;
    tracing::Span::current().record("user_id", &tracing::field::display(&user_id));

    let user = store
        .find_user_by_id(user_id)
        .await
        .context("Failed to load the user after login.")?
        .ok_or_else(|| ApiError::Unauthorized("Email ou senha inválidos".to_string()))?;

    start_session(tokens, jar, user)
}

#[post("/auth/logout")]
pub fn logout(tokens: &State<AuthTokens>, jar: &CookieJar<'_>) -> Json<SuccessResponse> {
    tokens.clear_cookie(jar);
    Json(SuccessResponse { success: true })
}

#[get("/auth/me")]
pub fn me(user: AuthenticatedUser) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse {
        user: user.user.into(),
    })
}

fn start_session(
    tokens: &AuthTokens,
    jar: &CookieJar<'_>,
    user: User,
) -> Result<Json<SessionResponse>, ApiError> {
    let token = tokens.issue(user.id)?;
    tokens.set_cookie(jar, token);
    Ok(Json(SessionResponse {
        user: SessionUser {
            id: user.id,
            email: user.email,
        },
    }))
}
