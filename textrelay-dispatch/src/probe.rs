//! Relay connection test with linear backoff.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Envelope, MailTransport, RelayCredential, error::ProbeError};

pub const PROBE_SUBJECT: &str = "Test SMTP Connection";
pub const PROBE_BODY: &str = "This is a test message.";

/// How hard a connection test tries before giving up.
///
/// After failed attempt `n` the test waits `n * backoff_step` before the
/// next one, so the defaults wait 2s and then 4s.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProbePolicy {
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "defaults::backoff_step_secs")]
    pub backoff_step_secs: u64,
}

impl Default for ProbePolicy {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            backoff_step_secs: defaults::backoff_step_secs(),
        }
    }
}

impl ProbePolicy {
    /// Delay after the given failed attempt (1-indexed).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        Duration::from_secs(self.backoff_step_secs.saturating_mul(u64::from(attempt)))
    }

    /// At least one attempt is always made.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

mod defaults {
    pub const fn max_attempts() -> u32 {
        3
    }

    pub const fn backoff_step_secs() -> u64 {
        2
    }
}

/// The message a probe sends: from the relay's sender to itself.
pub fn probe_envelope(relay: &RelayCredential) -> Envelope {
    Envelope {
        sender: relay.sender.clone(),
        recipient: relay.sender.clone(),
        content: format!("Subject: {PROBE_SUBJECT}\r\n\r\n{PROBE_BODY}"),
    }
}

/// Sends the probe message through `relay` until it succeeds or the policy's
/// attempts run out.
#[tracing::instrument(skip_all, fields(relay = %relay.address()))]
pub async fn probe_relay(
    transport: &dyn MailTransport,
    relay: &RelayCredential,
    policy: &ProbePolicy,
) -> Result<(), ProbeError> {
    let envelope = probe_envelope(relay);
    let attempts = policy.attempts();
    let mut attempt = 1;

    loop {
        tracing::info!("Attempt {attempt}/{attempts}: testing relay connection");

        let error = match transport.send(relay, &envelope).await {
            Ok(()) => {
                tracing::info!("Relay connection test passed");
                return Ok(());
            }
            Err(error) => error,
        };

        tracing::warn!(%error, "Relay connection attempt {attempt} failed");

        if attempt >= attempts {
            return Err(ProbeError::Exhausted {
                attempts,
                last_error: error,
            });
        }

        tokio::time::sleep(policy.delay_after(attempt)).await;
        attempt += 1;
    }
}
