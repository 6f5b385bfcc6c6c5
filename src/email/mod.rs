mod log_email_client;
mod smtp_email_client;
pub mod templates;

use crate::domain::UserEmail;
use async_trait::async_trait;
pub use log_email_client::LogEmailClient;
pub use smtp_email_client::SmtpEmailClient;
pub use templates::EmailContent;

#[async_trait]
pub trait Email: Send + Sync {
    async fn send_email(
        &self,
        recipient: &UserEmail,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> Result<(), anyhow::Error>;

    async fn send_content(
        &self,
        recipient: &UserEmail,
        content: &EmailContent,
    ) -> Result<(), anyhow::Error> {
        self.send_email(recipient, &content.subject, &content.html, &content.text)
            .await
    }
}
