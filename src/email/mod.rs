//! Email delivery abstractions.
//!
//! The credential manager and the contact form only ever talk to the
//! [`EmailSender`] trait. The SMTP implementation submits over STARTTLS with
//! a username/app-password pair; the log implementation is the default in
//! development mode and in tests. Delivery failure is always distinguishable
//! from success; there is no silent partial failure.

use crate::error::Error;
use anyhow::{Context, Result};
use lettre::{
    message::header::ContentType,
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
        PoolConfig,
    },
    Message, SmtpTransport, Transport,
};
use secrecy::{ExposeSecret, SecretString};
use std::{sync::Arc, time::Duration};
use tracing::info;

/// Outer bound on a single delivery attempt, SMTP handshake included.
/// Expiry counts as a delivery failure.
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);
const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Delivery abstraction used by the rotation manager and the contact form.
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error; the caller decides whether the
    /// failure is fatal.
    fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Local dev sender that logs the envelope instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            "email send stub"
        );
        Ok(())
    }
}

/// STARTTLS SMTP submission authenticated with a username/app-password pair.
pub struct SmtpEmailSender {
    transport: SmtpTransport,
    from: String,
}

impl SmtpEmailSender {
    /// Build the pooled transport. TLS is required; plaintext submission is
    /// never attempted.
    ///
    /// # Errors
    /// Returns an error when the relay host or TLS parameters are invalid.
    pub fn new(
        host: &str,
        port: u16,
        username: String,
        password: SecretString,
    ) -> Result<Self> {
        let tls = TlsParameters::builder(host.to_string())
            .build()
            .context("failed to build TLS parameters")?;

        let transport = SmtpTransport::relay(host)
            .context("failed to create SMTP transport")?
            .credentials(Credentials::new(
                username.clone(),
                password.expose_secret().to_string(),
            ))
            .port(port)
            .tls(Tls::Required(tls))
            .pool_config(PoolConfig::new().max_size(1))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        Ok(Self {
            transport,
            from: username,
        })
    }
}

impl EmailSender for SmtpEmailSender {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        let email = Message::builder()
            .from(
                format!("Portfolio Admin <{}>", self.from)
                    .parse()
                    .context("invalid from address")?,
            )
            .to(message.to.parse().context("invalid to address")?)
            .subject(&message.subject)
            .header(ContentType::TEXT_HTML)
            .body(message.html_body.clone())
            .context("failed to build email")?;

        self.transport.send(&email).context("SMTP send failed")?;

        Ok(())
    }
}

/// Run a blocking send off the async runtime with a bounded timeout.
///
/// # Errors
/// Returns `Error::Delivery` when the sender reports failure or the timeout
/// elapses.
pub async fn deliver(sender: Arc<dyn EmailSender>, message: EmailMessage) -> Result<(), Error> {
    let attempt = tokio::task::spawn_blocking(move || sender.send(&message));

    match tokio::time::timeout(DELIVERY_TIMEOUT, attempt).await {
        Ok(Ok(Ok(()))) => Ok(()),
        Ok(Ok(Err(e))) => Err(Error::delivery(e.to_string())),
        Ok(Err(join)) => Err(Error::Unexpected(anyhow::anyhow!(
            "email task panicked: {join}"
        ))),
        Err(_) => Err(Error::delivery("delivery timed out")),
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingSender;
    use super::*;

    fn message() -> EmailMessage {
        EmailMessage {
            to: "owner@example.com".to_string(),
            subject: "subject".to_string(),
            html_body: "<p>body</p>".to_string(),
        }
    }

    #[tokio::test]
    async fn deliver_reports_success() {
        let sender = Arc::new(RecordingSender::ok());
        assert!(deliver(sender.clone(), message()).await.is_ok());
        assert_eq!(sender.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deliver_surfaces_failure_as_delivery_error() {
        let sender = Arc::new(RecordingSender::failing());
        let err = deliver(sender, message()).await.unwrap_err();
        assert!(matches!(err, Error::Delivery(_)));
    }

    #[test]
    fn log_sender_always_succeeds() {
        let sender = LogEmailSender;
        assert!(sender.send(&message()).is_ok());
    }
}
