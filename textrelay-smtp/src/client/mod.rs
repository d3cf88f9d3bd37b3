//! Async SMTP client for submitting mail to a relay.
//!
//! The client is deliberately low level: every SMTP verb is a method that
//! returns the server's [`Response`], leaving interpretation of the status
//! code to the caller. It supports:
//!
//! - Plain TCP connections with STARTTLS upgrade
//! - `AUTH PLAIN` submission credentials
//! - Dot-stuffed `DATA` transfer
//! - EHLO capability inspection
//!
//! # Example
//!
//! ```no_run
//! use textrelay_smtp::client::{MessageBuilder, SmtpClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = SmtpClient::connect("smtp.example.com:587", "smtp.example.com".into()).await?;
//! client.read_greeting().await?;
//! let ehlo = client.ehlo("client.example.com").await?;
//! if ehlo.supports("STARTTLS") {
//!     client.starttls().await?;
//!     client.ehlo("client.example.com").await?;
//! }
//! client.auth_plain("user", "secret").await?;
//! client.mail_from("sender@example.com").await?;
//! client.rcpt_to("5551234567@txt.att.net").await?;
//! client.data().await?;
//!
//! let message = MessageBuilder::new()
//!     .from_mailbox("Alerts", "sender@example.com")
//!     .subject("Hello")
//!     .body("Hello from textrelay")
//!     .build()?;
//! client.send_data(&message).await?;
//! client.quit().await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod message;
mod response;
mod smtp_client;

pub use error::{ClientError, Result};
pub use message::MessageBuilder;
pub use response::{Response, ResponseLine};
pub use smtp_client::{SmtpClient, encode_data};
