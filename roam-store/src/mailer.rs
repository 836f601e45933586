use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use roam_core::notification::{MailError, Mailer, OutboundEmail};
use roam_shared::pii::Masked;
use tracing::info;

use crate::app_config::MailConfig;

/// SMTP delivery through lettre
#[derive(Clone)]
pub struct SmtpMailer {
    smtp_host: String,
    smtp_port: u16,
    credentials: Credentials,
    from: String,
}

impl SmtpMailer {
    pub fn new(smtp_host: &str, config: &MailConfig) -> Self {
        Self {
            smtp_host: smtp_host.to_string(),
            smtp_port: config.smtp_port,
            credentials: Credentials::new(config.username.clone(), config.password.clone()),
            from: format!("{} <{}>", config.from_name, config.from_email),
        }
    }

    fn build_transport(&self) -> Result<SmtpTransport, MailError> {
        Ok(SmtpTransport::relay(&self.smtp_host)
            .map_err(|e| MailError::Delivery(format!("SMTP relay error: {e}")))?
            .port(self.smtp_port)
            .credentials(self.credentials.clone())
            .build())
    }

    fn build_message(&self, email: &OutboundEmail) -> Result<Message, MailError> {
        Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| MailError::InvalidAddress(format!("{}: {e}", self.from)))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|e| MailError::InvalidAddress(format!("recipient: {e}")))?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| MailError::Delivery(format!("Failed to build email: {e}")))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        let message = self.build_message(email)?;
        let transport = self.build_transport()?;

        // lettre's SmtpTransport blocks
        tokio::task::spawn_blocking(move || {
            transport
                .send(&message)
                .map_err(|e| MailError::Delivery(e.to_string()))
        })
        .await
        .map_err(|e| MailError::Delivery(format!("Email task failed: {e}")))?
        .map(|_| ())
    }
}

/// Writes emails to the log instead of sending them. Used when no SMTP host is configured.
#[derive(Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        info!(
            to = ?Masked(email.to.as_str()),
            subject = %email.subject,
            "Email delivery disabled, logging message instead"
        );
        Ok(())
    }
}
