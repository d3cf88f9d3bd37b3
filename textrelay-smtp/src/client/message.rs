//! Plain-text RFC 5322 message composition.

use std::io::Write;

use super::error::{ClientError, Result};

/// Builder for the short plain-text messages relayed to carrier gateways.
///
/// ```
/// use textrelay_smtp::client::MessageBuilder;
///
/// let message = MessageBuilder::new()
///     .from_mailbox("Dispatch", "alerts@example.com")
///     .to("5551234567@txt.att.net")
///     .subject("Hello")
///     .body("On my way")
///     .build()
///     .unwrap();
///
/// assert!(message.starts_with("From: Dispatch <alerts@example.com>\r\n"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    from: Option<String>,
    to: Vec<String>,
    subject: Option<String>,
    body: Option<String>,
}

impl MessageBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `From` with a display name, `Name <address>`. An empty name
    /// falls back to the bare address.
    #[must_use]
    pub fn from_mailbox(mut self, name: &str, email: &str) -> Self {
        self.from = Some(if name.trim().is_empty() {
            email.to_string()
        } else {
            format!("{name} <{email}>")
        });
        self
    }

    #[must_use]
    pub fn to(mut self, email: impl Into<String>) -> Self {
        self.to.push(email.into());
        self
    }

    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    #[must_use]
    pub fn body(mut self, content: impl Into<String>) -> Self {
        self.body = Some(content.into());
        self
    }

    /// Renders the message.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MessageError`] when a header name or value
    /// contains a line break.
    pub fn build(self) -> Result<String> {
        let mut message = Vec::with_capacity(512);

        if let Some(from) = &self.from {
            write_header(&mut message, "From", from)?;
        }
        if !self.to.is_empty() {
            write_header(&mut message, "To", &self.to.join(", "))?;
        }
        if let Some(subject) = &self.subject {
            write_header(&mut message, "Subject", subject)?;
        }

        write!(&mut message, "MIME-Version: 1.0\r\n")?;
        write!(&mut message, "Content-Type: text/plain; charset=utf-8\r\n")?;
        write!(&mut message, "\r\n")?;

        if let Some(body) = &self.body {
            write!(&mut message, "{body}")?;
        }

        String::from_utf8(message).map_err(|e| ClientError::Utf8Error(e.utf8_error()))
    }
}

fn write_header(message: &mut Vec<u8>, name: &str, value: &str) -> Result<()> {
    if [name, value].iter().any(|part| part.contains(['\r', '\n'])) {
        return Err(ClientError::MessageError(format!(
            "header {name:?} contains a line break"
        )));
    }
    write!(message, "{name}: {value}\r\n")?;
    Ok(())
}
