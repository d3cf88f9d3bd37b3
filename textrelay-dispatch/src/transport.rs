//! Relay transports.
//!
//! [`SmtpTransport`] runs one SMTP transaction per message:
//! 1. Connects to the relay and reads the greeting
//! 2. Upgrades via STARTTLS when offered, reconnecting in plaintext if the
//!    upgrade fails (RFC 3207)
//! 3. Authenticates with `AUTH PLAIN` when the relay has a username
//! 4. Sends MAIL FROM, RCPT TO and DATA
//! 5. Sends QUIT, whose failure does not undo a delivered message

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use textrelay_smtp::client::{Response, SmtpClient};

use crate::{
    DispatchSettings, Envelope, RelayCredential, SmtpTimeouts,
    error::{PermanentError, TemporaryError, TransportError},
};

/// Hands a composed message to a relay.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, relay: &RelayCredential, envelope: &Envelope) -> Result<(), TransportError>;
}

/// SMTP submission through the workspace SMTP client.
#[derive(Debug, Clone)]
pub struct SmtpTransport {
    helo_domain: String,
    accept_invalid_certs: bool,
    timeouts: SmtpTimeouts,
}

impl SmtpTransport {
    pub fn new(helo_domain: impl Into<String>, accept_invalid_certs: bool, timeouts: SmtpTimeouts) -> Self {
        Self {
            helo_domain: helo_domain.into(),
            accept_invalid_certs,
            timeouts,
        }
    }

    pub fn from_settings(settings: &DispatchSettings) -> Self {
        Self::new(
            settings.helo_domain.as_str(),
            settings.accept_invalid_certs,
            settings.smtp_timeouts.clone(),
        )
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, relay: &RelayCredential, envelope: &Envelope) -> Result<(), TransportError> {
        SmtpTransaction {
            relay,
            envelope,
            helo_domain: &self.helo_domain,
            accept_invalid_certs: self.accept_invalid_certs,
            timeouts: &self.timeouts,
        }
        .execute()
        .await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TlsNegotiation {
    Upgraded,
    Skipped,
    RetryWithoutTls,
}

/// Bounds `operation` by `secs`, naming `what` in the timeout error.
async fn bounded<T, F>(secs: u64, what: &str, operation: F) -> Result<T, TransportError>
where
    F: Future<Output = textrelay_smtp::client::Result<T>>,
{
    let limit = Duration::from_secs(secs);
    tokio::time::timeout(limit, operation)
        .await
        .map_err(|_| TemporaryError::Timeout(format!("{what} timed out after {limit:?}")))?
        .map_err(TransportError::from)
}

struct SmtpTransaction<'a> {
    relay: &'a RelayCredential,
    envelope: &'a Envelope,
    helo_domain: &'a str,
    accept_invalid_certs: bool,
    timeouts: &'a SmtpTimeouts,
}

impl SmtpTransaction<'_> {
    #[tracing::instrument(
        level = "debug",
        skip(self),
        fields(relay = %self.relay.host, recipient = %self.envelope.recipient)
    )]
    async fn execute(self) -> Result<(), TransportError> {
        if self.accept_invalid_certs {
            tracing::warn!(
                relay = %self.relay.host,
                "TLS certificate validation is disabled for this relay"
            );
        }

        let mut client = self.connect_and_greet().await?;
        let mut ehlo = self.ehlo(&mut client).await?;

        match self.negotiate_tls(&mut client, &ehlo).await? {
            TlsNegotiation::Upgraded => ehlo = self.ehlo(&mut client).await?,
            TlsNegotiation::RetryWithoutTls => {
                tracing::info!(
                    relay = %self.relay.host,
                    "Reconnecting without STARTTLS per RFC 3207"
                );
                drop(client);
                client = self.connect_and_greet().await?;
                ehlo = self.ehlo(&mut client).await?;
            }
            TlsNegotiation::Skipped => {}
        }

        if self.relay.has_credentials() {
            self.authenticate(&mut client, &ehlo).await?;
        }

        self.send_mail_from(&mut client).await?;
        self.send_rcpt_to(&mut client).await?;
        self.send_message_data(&mut client).await?;

        if let Err(e) = bounded(self.timeouts.quit_secs, "QUIT", client.quit()).await {
            tracing::warn!(relay = %self.relay.host, "QUIT failed after successful delivery: {e}");
        }

        Ok(())
    }

    async fn connect_and_greet(&self) -> Result<SmtpClient, TransportError> {
        let address = self.relay.address();
        let limit = Duration::from_secs(self.timeouts.connect_secs);

        let client = tokio::time::timeout(
            limit,
            SmtpClient::connect(&address, self.relay.host.clone()),
        )
        .await
        .map_err(|_| TemporaryError::Timeout(format!("Connecting to {address} timed out after {limit:?}")))?
        .map_err(|e| TemporaryError::ConnectionFailed(format!("Failed to connect to {address}: {e}")))?;

        let mut client = client.accept_invalid_certs(self.accept_invalid_certs);

        let greeting = bounded(self.timeouts.connect_secs, "Greeting", client.read_greeting()).await?;
        if !greeting.is_success() {
            return Err(TemporaryError::ServerBusy(format!(
                "Server rejected connection: {}",
                greeting.message()
            ))
            .into());
        }

        Ok(client)
    }

    async fn ehlo(&self, client: &mut SmtpClient) -> Result<Response, TransportError> {
        let response = bounded(self.timeouts.ehlo_secs, "EHLO", client.ehlo(self.helo_domain)).await?;
        if !response.is_success() {
            return Err(TemporaryError::SmtpTemporary(format!(
                "Server rejected EHLO: {}",
                response.message()
            ))
            .into());
        }
        Ok(response)
    }

    async fn negotiate_tls(
        &self,
        client: &mut SmtpClient,
        ehlo: &Response,
    ) -> Result<TlsNegotiation, TransportError> {
        if !ehlo.supports("STARTTLS") {
            return Ok(TlsNegotiation::Skipped);
        }

        let outcome = bounded(self.timeouts.starttls_secs, "STARTTLS", client.starttls()).await;

        match outcome {
            Ok(response) if response.is_success() => {
                tracing::debug!(relay = %self.relay.host, "TLS negotiated via STARTTLS");
                Ok(TlsNegotiation::Upgraded)
            }
            Ok(response) => {
                tracing::info!(
                    relay = %self.relay.host,
                    response = %response.message(),
                    "Server rejected STARTTLS, will retry without TLS"
                );
                Ok(TlsNegotiation::RetryWithoutTls)
            }
            Err(e) => {
                tracing::info!(
                    relay = %self.relay.host,
                    error = %e,
                    "STARTTLS failed, will retry without TLS"
                );
                Ok(TlsNegotiation::RetryWithoutTls)
            }
        }
    }

    async fn authenticate(&self, client: &mut SmtpClient, ehlo: &Response) -> Result<(), TransportError> {
        if !client.is_tls() && !self.relay.is_loopback() {
            return Err(PermanentError::InsecureAuthentication(self.relay.host.clone()).into());
        }

        if !ehlo.supports_auth("PLAIN") {
            return Err(PermanentError::AuthenticationUnavailable(format!(
                "{} does not offer AUTH PLAIN",
                self.relay.host
            ))
            .into());
        }

        let response = bounded(
            self.timeouts.auth_secs,
            "AUTH",
            client.auth_plain(&self.relay.username, &self.relay.secret),
        )
        .await?;

        if !response.is_success() {
            return Err(TransportError::rejected(
                response.code,
                format!("Server rejected AUTH: {}", response.message()),
                PermanentError::AuthenticationFailed,
            ));
        }

        Ok(())
    }

    async fn send_mail_from(&self, client: &mut SmtpClient) -> Result<(), TransportError> {
        let response = bounded(
            self.timeouts.mail_from_secs,
            "MAIL FROM",
            client.mail_from(&self.envelope.sender),
        )
        .await?;

        if !response.is_success() {
            return Err(TransportError::rejected(
                response.code,
                format!("Server rejected MAIL FROM: {}", response.message()),
                PermanentError::MessageRejected,
            ));
        }

        Ok(())
    }

    async fn send_rcpt_to(&self, client: &mut SmtpClient) -> Result<(), TransportError> {
        let recipient = &self.envelope.recipient;
        let response = bounded(self.timeouts.rcpt_to_secs, "RCPT TO", client.rcpt_to(recipient)).await?;

        if !response.is_success() {
            return Err(TransportError::rejected(
                response.code,
                format!("Server rejected RCPT TO {recipient}: {}", response.message()),
                PermanentError::InvalidRecipient,
            ));
        }

        Ok(())
    }

    async fn send_message_data(&self, client: &mut SmtpClient) -> Result<(), TransportError> {
        let response = bounded(self.timeouts.data_secs, "DATA", client.data()).await?;
        if !response.is_intermediate() {
            return Err(TransportError::rejected(
                response.code,
                format!("Server rejected DATA: {}", response.message()),
                PermanentError::MessageRejected,
            ));
        }

        let response = bounded(
            self.timeouts.data_secs,
            "Message transmission",
            client.send_data(&self.envelope.content),
        )
        .await?;

        if !response.is_success() {
            return Err(TransportError::rejected(
                response.code,
                format!("Server rejected message data: {}", response.message()),
                PermanentError::MessageRejected,
            ));
        }

        Ok(())
    }
}
