use crate::authentication::AuthTokens;
use crate::billing::{BillingGateway, WebhookVerifier};
use crate::catchers::*;
use crate::configuration::Settings;
use crate::email::Email;
use crate::guards::CronSecret;
use crate::port_saver;
use crate::port_saver::Port;
use crate::routes::*;
use crate::store::Store;
use rocket::{Config, Ignite, Rocket};
use std::sync::Arc;

pub struct Application {
    pub server: Rocket<Ignite>,
    pub port: Port,
}

impl Application {
    /// Ignites the server with every collaborator managed as state. Port 0 binds a random port,
    /// readable from `port` once the server has lifted off.
    pub async fn build(
        configuration: &Settings,
        store: Arc<dyn Store>,
        email_client: Arc<dyn Email>,
        billing: Arc<dyn BillingGateway>,
    ) -> Result<Application, rocket::Error> {
        let (port_saver, port) = port_saver::create_pair();
        let application = &configuration.application;
        let server = rocket::custom(Config {
            port: application.port.unwrap_or(0),
            address: application.host,
            ..Config::debug_default()
        })
        .attach(port_saver)
        .manage(store)
        .manage(email_client)
        .manage(billing)
        .manage(AuthTokens::new(
            &configuration.auth,
            application.secure_cookies,
        ))
        .manage(WebhookVerifier::new(
            configuration.stripe.webhook_secret.clone(),
        ))
        .manage(CronSecret(application.cron_secret.clone()))
        .manage(ApplicationBaseUrl(
            application.base_url.trim_end_matches('/').to_string(),
        ))
        .manage(configuration.reports.clone())
        .mount(
            "/",
            routes![
                health,
                register,
                login,
                logout,
                me,
                list_establishments,
                create_establishment,
                get_establishment,
                update_establishment,
                public_establishment,
                submit_feedback,
                create_checkout,
                create_portal,
                stripe_webhook,
                weekly_report,
                weekly_reports,
                test_weekly_report,
                send_test_email,
            ],
        )
        .register(
            "/",
            catchers![
                bad_request,
                unauthorized,
                forbidden,
                not_found,
                unprocessable_entity_to_bad_request,
                internal_error,
            ],
        )
        .ignite()
        .await?;
        Ok(Application { server, port })
    }
}
