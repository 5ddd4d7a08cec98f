//! SMTP delivery of the month-end report.

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{info, instrument};

use crate::config::ConfigError;

/// Errors that can occur while emailing a report.
#[derive(Debug, Error)]
pub enum MailError {
    /// Failed to build the SMTP transport.
    #[error("SMTP transport error: {0}")]
    Transport(String),

    /// Invalid sender or recipient address.
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    /// Failed to build the message.
    #[error("failed to build email: {0}")]
    Build(String),

    /// Server rejected the message.
    #[error("failed to send email: {0}")]
    Send(String),
}

/// SMTP settings for report delivery.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Login, also used as the From address.
    pub username: String,
    password: SecretString,
    pub recipients: Vec<String>,
}

impl MailConfig {
    /// Read `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD` and
    /// `REPORT_EMAIL_TO`.
    ///
    /// Returns `Ok(None)` unless host, username, password and at least one
    /// recipient are all present.
    pub fn from_lookup<F>(var: &F) -> Result<Option<Self>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (Some(smtp_host), Some(username), Some(password), Some(to)) = (
            var("SMTP_HOST"),
            var("SMTP_USERNAME"),
            var("SMTP_PASSWORD"),
            var("REPORT_EMAIL_TO"),
        ) else {
            return Ok(None);
        };

        let smtp_port = var("SMTP_PORT")
            .unwrap_or_else(|| "587".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::Invalid("SMTP_PORT"))?;

        let recipients: Vec<String> = to
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if recipients.is_empty() {
            return Ok(None);
        }

        Ok(Some(Self {
            smtp_host,
            smtp_port,
            username,
            password: SecretString::from(password),
            recipients,
        }))
    }
}

/// Sends report emails through a pooled STARTTLS connection.
pub struct ReportMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    recipients: Vec<String>,
}

impl ReportMailer {
    /// Build the transport. No connection is made until the first send.
    pub fn new(config: MailConfig) -> Result<Self, MailError> {
        let creds = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        info!(
            host = %config.smtp_host,
            port = config.smtp_port,
            recipients = config.recipients.len(),
            "Created report mailer"
        );

        Ok(Self {
            transport,
            from_address: config.username,
            recipients: config.recipients,
        })
    }

    /// Email a plain-text report to every configured recipient.
    #[instrument(skip(self, body))]
    pub async fn send_report(&self, subject: &str, body: &str) -> Result<(), MailError> {
        let message = self.build_message(subject, body)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Send(e.to_string()))?;

        info!(recipients = ?self.recipients, "Report email sent");
        Ok(())
    }

    fn build_message(&self, subject: &str, body: &str) -> Result<Message, MailError> {
        let from: Mailbox = self
            .from_address
            .parse()
            .map_err(|e| MailError::InvalidAddress(format!("From: {}", e)))?;

        let mut builder = Message::builder()
            .from(from)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN);

        for to in &self.recipients {
            let addr: Mailbox = to
                .parse()
                .map_err(|e| MailError::InvalidAddress(format!("To '{}': {}", to, e)))?;
            builder = builder.to(addr);
        }

        builder
            .body(body.to_string())
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(recipients: &[&str]) -> MailConfig {
        MailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            username: "bot@example.com".to_string(),
            password: SecretString::from("pw".to_string()),
            recipients: recipients.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_incomplete_settings_disable_mailer() {
        let var = |key: &str| match key {
            "SMTP_HOST" => Some("smtp.example.com".to_string()),
            _ => None,
        };
        assert!(MailConfig::from_lookup(&var).unwrap().is_none());
    }

    #[test]
    fn test_invalid_port() {
        let var = |key: &str| match key {
            "SMTP_PORT" => Some("many".to_string()),
            _ => Some("x@example.com".to_string()),
        };
        assert!(matches!(
            MailConfig::from_lookup(&var),
            Err(ConfigError::Invalid("SMTP_PORT"))
        ));
    }

    #[tokio::test]
    async fn test_build_message_headers() {
        let mailer = ReportMailer::new(config(&["a@example.com", "b@example.com"])).unwrap();
        let message = mailer.build_message("Monthly Report - 2024-05", "body").unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Monthly Report - 2024-05"));
        assert!(raw.contains("a@example.com"));
        assert!(raw.contains("b@example.com"));
    }

    #[tokio::test]
    async fn test_bad_recipient_rejected() {
        let mailer = ReportMailer::new(config(&["not an address"])).unwrap();
        assert!(matches!(
            mailer.build_message("s", "b"),
            Err(MailError::InvalidAddress(_))
        ));
    }
}
