use crate::store::Store;
use anyhow::{anyhow, Context};
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use secrecy::{ExposeSecret, Secret};
use uuid::Uuid;

/// Hash of a throwaway password, verified against when the e-mail is unknown so
/// both failure paths cost one argon2 run.
const FALLBACK_PASSWORD_HASH: &str = "$argon2id$v=19$m=15000,t=2,p=1$\
    gZiV/M1gPc22ElAH/Jh1Hw$\
    CWOrkoo7oJBQ/iyh7uJ0LO2aLEfrHwTWllSAxT0zRno";

pub struct Credentials {
    pub email: String,
    pub password: Secret<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials.")]
    InvalidCredentials(#[source] anyhow::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

#[tracing::instrument(name = "Validate credentials", skip(credentials, store))]
pub async fn validate_credentials(
    credentials: Credentials,
    store: &dyn Store,
) -> Result<Uuid, AuthError> {
    let mut user_id = None;
    let mut expected_password_hash = Secret::new(FALLBACK_PASSWORD_HASH.to_string());

    let email = credentials.email.trim().to_lowercase();
    if let Some(user) = store
        .find_user_by_email(&email)
        .await
        .context("Failed to retrieve stored credentials.")?
    {
        user_id = Some(user.id);
        expected_password_hash = user.password_hash;
    }

    tokio::task::spawn_blocking(move || {
        verify_password_hash(expected_password_hash, credentials.password)
    })
    .await
    .context("Failed to spawn blocking task.")??;

    user_id
        .ok_or_else(|| anyhow!("Unknown e-mail."))
        .map_err(AuthError::InvalidCredentials)
}

#[tracing::instrument(name = "Verify password hash", skip_all)]
fn verify_password_hash(
    expected_password_hash: Secret<String>,
    password_candidate: Secret<String>,
) -> Result<(), AuthError> {
    let expected_password_hash = PasswordHash::new(expected_password_hash.expose_secret())
        .map_err(|e| anyhow!("Failed to parse hash in PHC string format: {}", e))?;

    Argon2::default()
        .verify_password(
            password_candidate.expose_secret().as_bytes(),
            &expected_password_hash,
        )
        .map_err(|e| AuthError::InvalidCredentials(anyhow!("Invalid password: {}", e)))
}

/// Hashes on the blocking pool.
pub async fn compute_password_hash(password: Secret<String>) -> Result<Secret<String>, anyhow::Error> {
    tokio::task::spawn_blocking(move || hash_password(password))
        .await
        .context("Failed to spawn blocking task.")?
}

fn hash_password(password: Secret<String>) -> Result<Secret<String>, anyhow::Error> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let params = Params::new(15000, 2, 1, None).map_err(|e| anyhow!(e))?;
    let password_hash = Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.expose_secret().as_bytes(), &salt)
        .map_err(|e| anyhow!(e))?
        .to_string();
    Ok(Secret::new(password_hash))
}
