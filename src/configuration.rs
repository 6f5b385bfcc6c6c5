use crate::domain::UserEmail;
use secrecy::{ExposeSecret, Secret};
use serde_aux::field_attributes::deserialize_number_from_string;
use serde_aux::field_attributes::deserialize_option_number_from_string;
use std::net::IpAddr;

#[derive(Debug, PartialEq, Eq)]
pub enum Environment {
    Local,
    Production,
}

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub email_client: EmailClientSettings,
    pub auth: AuthSettings,
    pub stripe: StripeSettings,
    pub reports: ReportSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_option_number_from_string")]
    pub port: Option<u16>,
    pub host: IpAddr,
    pub base_url: String,
    /// Shared bearer secret for the scheduled report endpoints. Empty rejects every call.
    pub cron_secret: Secret<String>,
    pub secure_cookies: bool,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub database_name: String,
    pub require_ssl: bool,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_connections: u32,
}

#[derive(serde::Deserialize, Clone)]
pub struct EmailClientSettings {
    pub smtp_host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub smtp_port: u16,
    pub username: Option<String>,
    pub password: Option<Secret<String>>,
    pub sender_email: String,
    pub sender_name: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

#[derive(serde::Deserialize, Clone)]
pub struct AuthSettings {
    pub jwt_secret: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub token_ttl_days: i64,
}

#[derive(serde::Deserialize, Clone)]
pub struct StripeSettings {
    pub secret_key: Secret<String>,
    pub price_id: String,
    pub webhook_secret: Secret<String>,
    pub api_base_url: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct ReportSettings {
    pub send_empty_reports: bool,
}

impl EmailClientSettings {
    pub fn sender(&self) -> Result<UserEmail, String> {
        UserEmail::parse(self.sender_email.clone())
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_milliseconds)
    }

    /// SMTP delivery needs both halves of the credentials.
    pub fn is_configured(&self) -> bool {
        let has_username = self.username.as_deref().map_or(false, |u| !u.is_empty());
        let has_password = self
            .password
            .as_ref()
            .map_or(false, |p| !p.expose_secret().is_empty());
        has_username && has_password
    }
}

/// Signing secret shipped in `base.yaml` for local development.
pub const DEVELOPMENT_JWT_SECRET: &str = "local-development-secret-change-me";

impl AuthSettings {
    /// Production deployments must override the development signing secret.
    pub fn check_for(&self, environment: &Environment) -> Result<(), String> {
        let secret = self.jwt_secret.expose_secret();
        if *environment != Environment::Production {
            return Ok(());
        }
        if secret.trim().is_empty() {
            return Err("auth.jwt_secret must be set in production.".into());
        }
        if secret == DEVELOPMENT_JWT_SECRET {
            return Err("auth.jwt_secret still holds the development default.".into());
        }
        Ok(())
    }
}

impl StripeSettings {
    pub fn is_configured(&self) -> bool {
        !self.secret_key.expose_secret().is_empty() && !self.price_id.is_empty()
    }
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either 'local' or 'production'.",
                other
            )),
        }
    }
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> Secret<String> {
        Secret::new(format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.username,
            self.password.expose_secret(),
            self.host,
            self.port,
            self.database_name,
            ssl_mode(self.require_ssl)
        ))
    }

    pub fn connection_string_without_database(&self) -> Secret<String> {
        Secret::new(format!(
            "postgres://{}:{}@{}:{}?sslmode={}",
            self.username,
            self.password.expose_secret(),
            self.host,
            self.port,
            ssl_mode(self.require_ssl)
        ))
    }
}

fn ssl_mode(require_ssl: bool) -> &'static str {
    match require_ssl {
        true => "require",
        false => "prefer",
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("Failed to determine the current directory: {}", e)))?;
    let configuration_directory = base_path.join("configuration");
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    let mut settings = config::Config::default();
    settings.merge(config::File::from(configuration_directory.join("base")).required(true))?;
    settings.merge(
        config::File::from(configuration_directory.join(environment.as_str())).required(true),
    )?;
    settings.merge(config::Environment::with_prefix("app").separator("__"))?;
    let settings: Settings = settings.try_into()?;
    settings
        .auth
        .check_for(&environment)
        .map_err(config::ConfigError::Message)?;
    Ok(settings)
}
