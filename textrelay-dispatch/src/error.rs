//! Typed errors for dispatch runs, relay transports and connection tests.
//!
//! Transport failures are categorized the same way throughout:
//! - Permanent failures (5xx replies, rejected or impossible authentication)
//! - Temporary failures (4xx replies, network and TLS trouble, timeouts)
//! - System errors (protocol violations, internal problems)

use std::path::PathBuf;

use textrelay_smtp::client::ClientError;
use thiserror::Error;

/// Why a run could not start. Returned before any relay is contacted.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Terminal failure of a relay connection test.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("SMTP connection test failed after {attempts} attempts: {last_error}")]
    Exhausted {
        attempts: u32,
        last_error: TransportError,
    },
}

/// Failure of a single relay send.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Permanent failure: {0}")]
    Permanent(#[from] PermanentError),

    #[error("Temporary failure: {0}")]
    Temporary(#[from] TemporaryError),

    #[error("System error: {0}")]
    System(#[from] SystemError),
}

#[derive(Debug, Error)]
pub enum PermanentError {
    /// The relay refused the recipient.
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    /// The relay refused the sender or the message content.
    #[error("Message rejected: {0}")]
    MessageRejected(String),

    /// The relay rejected the credentials.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Credentials are configured but the relay does not offer `AUTH PLAIN`.
    #[error("Authentication unavailable: {0}")]
    AuthenticationUnavailable(String),

    /// Credentials would travel over an unencrypted connection.
    #[error("Refusing to authenticate without TLS: {0}")]
    InsecureAuthentication(String),
}

#[derive(Debug, Error)]
pub enum TemporaryError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Server busy: {0}")]
    ServerBusy(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Temporary SMTP error: {0}")]
    SmtpTemporary(String),

    #[error("TLS handshake failed: {0}")]
    TlsHandshakeFailed(String),
}

#[derive(Debug, Error)]
pub enum SystemError {
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TransportError {
    #[must_use]
    pub const fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }

    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent(_))
    }

    #[must_use]
    pub const fn is_system(&self) -> bool {
        matches!(self, Self::System(_))
    }

    /// Maps a non-success reply to a rejection: 5xx is permanent, anything
    /// else is worth another try.
    pub(crate) fn rejected(code: u16, message: String, permanent: fn(String) -> PermanentError) -> Self {
        if (500..600).contains(&code) {
            permanent(message).into()
        } else {
            TemporaryError::SmtpTemporary(message).into()
        }
    }
}

/// SMTP client errors, categorized by response code and failure kind.
impl From<ClientError> for TransportError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::SmtpError { code, message } if (400..500).contains(&code) => {
                Self::Temporary(TemporaryError::SmtpTemporary(format!("{code} {message}")))
            }
            ClientError::SmtpError { code, message } if (500..600).contains(&code) => {
                Self::Permanent(PermanentError::MessageRejected(format!("{code} {message}")))
            }
            ClientError::SmtpError { code, message }
            | ClientError::UnexpectedResponse { code, message } => Self::System(
                SystemError::Internal(format!("Unexpected SMTP response: {code} {message}")),
            ),
            ClientError::Io(e) => {
                Self::Temporary(TemporaryError::ConnectionFailed(format!("I/O error: {e}")))
            }
            ClientError::ConnectionClosed => Self::Temporary(TemporaryError::ConnectionFailed(
                "Connection closed unexpectedly".to_string(),
            )),
            ClientError::TlsError(msg) => Self::Temporary(TemporaryError::TlsHandshakeFailed(msg)),
            ClientError::ParseError(msg) => Self::System(SystemError::Internal(format!(
                "SMTP protocol parse error: {msg}"
            ))),
            ClientError::MessageError(msg) => Self::System(SystemError::InvalidMessage(msg)),
            ClientError::Utf8Error(e) => {
                Self::System(SystemError::Internal(format!("UTF-8 decoding error: {e}")))
            }
        }
    }
}

/// Failure to load the carrier directory.
#[derive(Debug, Error)]
pub enum CarrierError {
    #[error("Unable to read carrier directory {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid carrier directory {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}
