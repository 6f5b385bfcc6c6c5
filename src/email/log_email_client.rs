use crate::domain::UserEmail;
use crate::email::Email;
use async_trait::async_trait;

/// Stands in for SMTP when no credentials are configured: nothing leaves the process.
pub struct LogEmailClient;

#[async_trait]
impl Email for LogEmailClient {
    async fn send_email(
        &self,
        recipient: &UserEmail,
        subject: &str,
        _html_content: &str,
        text_content: &str,
    ) -> Result<(), anyhow::Error> {
        tracing::info!(
            recipient = %recipient,
            subject,
            body = text_content,
            "E-mail delivery is not configured, logging instead of sending"
        );
        Ok(())
    }
}
