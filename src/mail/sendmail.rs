// mail/sendmail.rs
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tokio::time::{sleep, Duration};

use crate::config::Config;

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_MS: u64 = 1000;

#[derive(Debug, Clone, thiserror::Error)]
#[error("Mail error: {0}")]
pub struct MailError(pub String);

/// SMTP mailer built once from configuration; no ambient env lookups at
/// send time.
#[derive(Clone)]
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_email: String,
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailer")
            .field("from_email", &self.from_email)
            .finish()
    }
}

impl Mailer {
    pub fn new(config: &Config) -> Result<Self, MailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| MailError(e.to_string()))?;

        if !config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ));
        }

        Ok(Mailer {
            transport: builder.build(),
            from_email: config.from_email.clone(),
        })
    }

    /// Send with bounded exponential-backoff retries.
    pub async fn send(&self, to_email: &str, subject: &str, html: &str) -> Result<(), MailError> {
        if to_email.is_empty() || !to_email.contains('@') {
            return Err(MailError(format!("Invalid email address: {}", to_email)));
        }

        let mut last_error = None;

        for attempt in 1..=MAX_RETRIES {
            match self.send_once(to_email, subject, html).await {
                Ok(()) => {
                    tracing::info!("Email sent to {} ({})", to_email, subject);
                    return Ok(());
                }
                Err(e) => {
                    last_error = Some(e);
                    if attempt < MAX_RETRIES {
                        let delay = RETRY_DELAY_MS * 2_u64.pow(attempt - 1);
                        tracing::warn!(
                            "Email send attempt {} failed for {}. Retrying in {}ms",
                            attempt,
                            to_email,
                            delay
                        );
                        sleep(Duration::from_millis(delay)).await;
                    }
                }
            }
        }

        let message = last_error
            .map(|e| format!("Failed after {} retries: {}", MAX_RETRIES, e))
            .unwrap_or_else(|| "Unknown email sending error".to_string());
        tracing::error!("Email failed for {}: {}", to_email, message);
        Err(MailError(message))
    }

    async fn send_once(&self, to_email: &str, subject: &str, html: &str) -> Result<(), MailError> {
        let message = Message::builder()
            .from(
                self.from_email
                    .parse()
                    .map_err(|_| MailError(format!("Invalid from address: {}", self.from_email)))?,
            )
            .to(to_email
                .parse()
                .map_err(|_| MailError(format!("Invalid to address: {}", to_email)))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .map_err(|e| MailError(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| MailError(e.to_string()))
    }
}
