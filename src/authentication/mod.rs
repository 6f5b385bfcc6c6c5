mod password;
mod token;

pub use password::{compute_password_hash, validate_credentials, AuthError, Credentials};
pub use token::{AuthTokens, AUTH_COOKIE};
