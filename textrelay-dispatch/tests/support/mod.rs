#![allow(dead_code)]

pub mod mock_server;

use std::{collections::HashSet, sync::Arc, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;
use textrelay_dispatch::{
    CarrierDirectory, Envelope, MailTransport, RelayCredential, TemporaryError, TransportError,
};

/// One call to [`RecordingTransport::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub relay_host: String,
    pub recipient: String,
    pub at: tokio::time::Instant,
}

/// In-memory transport that records every send and fails on request.
#[derive(Default)]
pub struct RecordingTransport {
    deliveries: Mutex<Vec<Delivery>>,
    failing_hosts: HashSet<String>,
    failing_recipients: HashSet<String>,
    always_fail: bool,
    delays: Vec<(String, Duration)>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send fails with a connection error.
    pub fn failing() -> Self {
        Self {
            always_fail: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn fail_host(mut self, host: &str) -> Self {
        self.failing_hosts.insert(host.to_string());
        self
    }

    #[must_use]
    pub fn fail_recipient(mut self, recipient: &str) -> Self {
        self.failing_recipients.insert(recipient.to_string());
        self
    }

    /// Sends to `recipient` take `delay` to complete.
    #[must_use]
    pub fn delay_recipient(mut self, recipient: &str, delay: Duration) -> Self {
        self.delays.push((recipient.to_string(), delay));
        self
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().clone()
    }

    pub fn attempts(&self) -> usize {
        self.deliveries.lock().len()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, relay: &RelayCredential, envelope: &Envelope) -> Result<(), TransportError> {
        self.deliveries.lock().push(Delivery {
            relay_host: relay.host.clone(),
            recipient: envelope.recipient.clone(),
            at: tokio::time::Instant::now(),
        });

        if let Some((_, delay)) = self.delays.iter().find(|(r, _)| *r == envelope.recipient) {
            tokio::time::sleep(*delay).await;
        }

        if self.always_fail
            || self.failing_hosts.contains(&relay.host)
            || self.failing_recipients.contains(&envelope.recipient)
        {
            return Err(TemporaryError::ConnectionFailed(format!("{} refused", relay.host)).into());
        }

        Ok(())
    }
}

pub fn relay(host: &str) -> RelayCredential {
    RelayCredential {
        host: host.to_string(),
        port: 25,
        username: String::new(),
        secret: String::new(),
        sender: format!("noreply@{host}"),
        enabled: true,
    }
}

pub fn relays(count: usize) -> Vec<RelayCredential> {
    (0..count).map(|i| relay(&format!("relay{i}"))).collect()
}

pub fn carriers() -> Arc<CarrierDirectory> {
    Arc::new(
        [
            ("att", "txt.att.net"),
            ("verizon", "vtext.com"),
            ("tmobile", "tmomail.net"),
        ]
        .into_iter()
        .collect(),
    )
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}
