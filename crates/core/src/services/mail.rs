//! Outgoing mail.
//!
//! The only mail hasker sends is the notice to a question's author that a
//! new answer arrived.

use std::sync::Arc;

use async_trait::async_trait;
use hasker_common::{AppError, AppResult, config::MailConfig};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
};
use tracing::info;

/// A plain-text mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl MailMessage {
    /// Notice for a question's author about a new answer.
    #[must_use]
    pub fn answer_notification(
        to: &str,
        question_url: &str,
        question_text: &str,
        answer_user: &str,
        answer_text: &str,
    ) -> Self {
        let body = format!(
            "Your question has a new answer.\n\n\
             Question: {question_url}\n\n\
             {question_text}\n\n\
             {answer_user} answered:\n\n\
             {answer_text}\n"
        );

        Self {
            to: to.to_string(),
            subject: "Your question has an answer!".to_string(),
            body,
        }
    }
}

/// Something that delivers mail.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> AppResult<()>;
}

/// Shared mailer handle.
pub type MailService = Arc<dyn Mailer>;

/// SMTP delivery through lettre.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build from an `smtp://` or `smtps://` URL and a sender address.
    pub fn new(smtp_url: &str, from: &str) -> AppResult<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::from_url(smtp_url)
            .map_err(|e| AppError::Config(format!("Invalid SMTP URL: {e}")))?
            .build();
        let from = from
            .parse::<Mailbox>()
            .map_err(|e| AppError::Config(format!("Invalid sender address: {e}")))?;

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: MailMessage) -> AppResult<()> {
        let to = message
            .to
            .parse::<Mailbox>()
            .map_err(|e| AppError::Mail(format!("Invalid recipient {}: {e}", message.to)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(message.body)
            .map_err(|e| AppError::Mail(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| AppError::Mail(e.to_string()))?;

        Ok(())
    }
}

/// Logs mail instead of sending it. Used when no SMTP server is configured.
#[derive(Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> AppResult<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            "Mail not sent (no SMTP server configured)"
        );
        Ok(())
    }
}

/// Pick the mailer for a configuration.
pub fn mailer_from_config(config: &MailConfig) -> AppResult<MailService> {
    match config.smtp_url.as_deref() {
        Some(url) if !url.is_empty() => Ok(Arc::new(SmtpMailer::new(url, &config.from)?)),
        _ => Ok(Arc::new(LogMailer)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_notification() {
        let msg = MailMessage::answer_notification(
            "author@example.com",
            "https://hasker.example/hasker/question/q1/",
            "How do I borrow twice?",
            "bob",
            "Use a RefCell.",
        );

        assert_eq!(msg.to, "author@example.com");
        assert_eq!(msg.subject, "Your question has an answer!");
        assert!(msg.body.contains("https://hasker.example/hasker/question/q1/"));
        assert!(msg.body.contains("How do I borrow twice?"));
        assert!(msg.body.contains("bob answered:"));
        assert!(msg.body.contains("Use a RefCell."));
    }

    #[test]
    fn test_mailer_from_config_without_smtp() {
        let config = MailConfig {
            smtp_url: None,
            from: "hasker-admin@hasker.com".to_string(),
        };
        assert!(mailer_from_config(&config).is_ok());
    }

    #[test]
    fn test_smtp_mailer_rejects_bad_sender() {
        let result = SmtpMailer::new("smtp://localhost:2525", "not an address");
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_log_mailer_never_fails() {
        let msg = MailMessage {
            to: "a@example.com".to_string(),
            subject: "s".to_string(),
            body: "b".to_string(),
        };
        assert!(LogMailer.send(msg).await.is_ok());
    }
}
