//! Failures raised while talking to a relay.

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("relay I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The relay sent something that is not a well-formed reply.
    #[error("malformed relay reply: {0}")]
    ParseError(String),

    /// A 2xx/3xx code other than the one the exchange expects.
    #[error("relay answered {code} unexpectedly: {message}")]
    UnexpectedResponse { code: u16, message: String },

    /// A 4xx or 5xx reply.
    #[error("relay rejected with {code}: {message}")]
    SmtpError { code: u16, message: String },

    #[error("TLS negotiation failed: {0}")]
    TlsError(String),

    /// Headers or body could not be assembled into a message.
    #[error("cannot compose message: {0}")]
    MessageError(String),

    #[error("relay closed the connection")]
    ConnectionClosed,

    #[error("relay reply is not UTF-8: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
