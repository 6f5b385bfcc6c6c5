use anyhow::anyhow;
use dizai::billing::StripeClient;
use dizai::configuration::get_configuration;
use dizai::email::{Email, LogEmailClient, SmtpEmailClient};
use dizai::startup::Application;
use dizai::store::PgStore;
use dizai::telemetry::{get_subscriber, init_subscriber};
use std::sync::Arc;

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("dizai".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let configuration = get_configuration()?;

    let store = PgStore::connect(&configuration.database)?;
    store.run_migrations()?;

    let email_client: Arc<dyn Email> = if configuration.email_client.is_configured() {
        Arc::new(SmtpEmailClient::new(&configuration.email_client)?)
    } else {
        tracing::warn!("SMTP credentials are not configured, e-mails will only be logged");
        Arc::new(LogEmailClient)
    };

    if !configuration.stripe.is_configured() {
        tracing::warn!("Stripe is not configured, billing calls will fail");
    }
    let billing = StripeClient::new(
        &configuration.stripe,
        configuration.application.base_url.clone(),
        std::time::Duration::from_secs(10),
    )?;

    let application = Application::build(
        &configuration,
        Arc::new(store),
        email_client,
        Arc::new(billing),
    )
    .await
    .map_err(|e| anyhow!("Failed to build the server: {}", e))?;
    application
        .server
        .launch()
        .await
        .map_err(|e| anyhow!("The server stopped with an error: {}", e))?;
    Ok(())
}
