use crate::configuration::EmailClientSettings;
use crate::domain::UserEmail;
use crate::email::Email;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;

pub struct SmtpEmailClient {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpEmailClient {
    /// Builds a STARTTLS relay client. Fails when credentials are missing.
    pub fn new(settings: &EmailClientSettings) -> Result<Self, anyhow::Error> {
        let username = settings
            .username
            .clone()
            .ok_or_else(|| anyhow!("The SMTP username is not configured."))?;
        let password = settings
            .password
            .as_ref()
            .ok_or_else(|| anyhow!("The SMTP password is not configured."))?;
        let sender_email = settings.sender().map_err(|e| anyhow!(e))?;
        let sender_address: Address = sender_email
            .as_ref()
            .parse()
            .context("The sender e-mail is not a valid mailbox address.")?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)
            .context("Failed to set up the SMTP relay.")?
            .port(settings.smtp_port)
            .credentials(Credentials::new(
                username,
                password.expose_secret().to_string(),
            ))
            .timeout(Some(settings.timeout()))
            .build();

        Ok(Self {
            transport,
            sender: Mailbox::new(Some(settings.sender_name.clone()), sender_address),
        })
    }
}

#[async_trait]
impl Email for SmtpEmailClient {
    #[tracing::instrument(name = "Sending e-mail over SMTP", skip(self, html_content, text_content))]
    async fn send_email(
        &self,
        recipient: &UserEmail,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> Result<(), anyhow::Error> {
        let recipient_address: Address = recipient
            .as_ref()
            .parse()
            .context("The recipient is not a valid mailbox address.")?;
        let message = Message::builder()
            .from(self.sender.clone())
            .to(Mailbox::new(None, recipient_address))
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(
                text_content.to_string(),
                html_content.to_string(),
            ))
            .context("Failed to build the e-mail message.")?;

        self.transport
            .send(message)
            .await
            .context("The SMTP server rejected the message.")?;
        Ok(())
    }
}
