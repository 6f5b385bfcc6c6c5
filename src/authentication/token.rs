use crate::configuration::AuthSettings;
use anyhow::Context;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rocket::http::{Cookie, CookieJar, SameSite};
use secrecy::{ExposeSecret, Secret};
use uuid::Uuid;

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Claims {
    sub: Uuid,
    iat: i64,
    exp: i64,
}

/// Issues and checks the HS256 session tokens carried in the auth cookie.
pub struct AuthTokens {
    secret: Secret<String>,
    ttl: Duration,
    secure_cookies: bool,
}

impl AuthTokens {
    pub fn new(settings: &AuthSettings, secure_cookies: bool) -> Self {
        Self {
            secret: settings.jwt_secret.clone(),
            ttl: Duration::days(settings.token_ttl_days),
            secure_cookies,
        }
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )
        .context("Failed to sign the session token.")
    }

    /// Returns the user id of a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Result<Uuid, anyhow::Error> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .context("The session token is invalid or expired.")?;
        Ok(data.claims.sub)
    }

    pub fn set_cookie(&self, jar: &CookieJar<'_>, token: String) {
        let cookie = Cookie::build((AUTH_COOKIE, token))
            .http_only(true)
            .same_site(SameSite::Lax)
            .path("/")
            .secure(self.secure_cookies)
            .max_age(rocket::time::Duration::seconds(self.ttl.num_seconds()));
        jar.add(cookie);
    }

    pub fn clear_cookie(&self, jar: &CookieJar<'_>) {
        jar.remove(Cookie::build(AUTH_COOKIE).path("/"));
    }
}
