//! Bulk dispatch: expand carriers × numbers into gateway addresses and send
//! one message per address through a per-run [`RelayPool`].

use std::sync::Arc;

use futures_util::{StreamExt, stream};
use textrelay_common::internal;
use textrelay_smtp::client::MessageBuilder;

use crate::{
    CarrierDirectory, DispatchOutcome, DispatchReport, DispatchSettings, Envelope,
    MailTransport, OutboundMessage, RelayCredential, RelayPool,
    error::{DispatchError, ProbeError, SystemError, TransportError},
    pool::AcquiredRelay,
    probe::probe_relay,
};

/// Gateway addresses for every (carrier, number) pair, carrier-major.
///
/// Carriers missing from the directory contribute nothing. Duplicates are kept.
pub fn expand_addresses(
    directory: &CarrierDirectory,
    carriers: &[String],
    numbers: &[String],
) -> Vec<String> {
    carriers
        .iter()
        .filter_map(|carrier| {
            let domain = directory.domain(carrier);
            if domain.is_none() {
                tracing::debug!(carrier = %carrier, "Skipping unknown carrier");
            }
            domain
        })
        .flat_map(|domain| numbers.iter().map(move |number| format!("{number}@{domain}")))
        .collect()
}

/// Composes the message for one gateway address sent through `relay`.
pub fn compose_envelope(
    message: &OutboundMessage,
    relay: &RelayCredential,
    target: &str,
) -> Result<Envelope, TransportError> {
    let content = MessageBuilder::new()
        .from_mailbox(&message.from_name, &relay.sender)
        .to(target)
        .subject(&message.subject)
        .body(&message.body)
        .build()
        .map_err(|e| SystemError::InvalidMessage(e.to_string()))?;

    Ok(Envelope {
        sender: relay.sender.clone(),
        recipient: target.to_string(),
        content,
    })
}

/// Runs dispatches and connection tests against a shared carrier directory
/// and transport.
#[derive(Clone)]
pub struct Dispatcher {
    carriers: Arc<CarrierDirectory>,
    transport: Arc<dyn MailTransport>,
    settings: DispatchSettings,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("carriers", &self.carriers.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(
        carriers: Arc<CarrierDirectory>,
        transport: Arc<dyn MailTransport>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            carriers,
            transport,
            settings,
        }
    }

    pub const fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    pub fn carriers(&self) -> &CarrierDirectory {
        &self.carriers
    }

    /// Sends `message` to every gateway address of `carriers` × `numbers`.
    ///
    /// Every supplied relay is treated as enabled. `caps[i]` limits how many
    /// messages relay `i` may carry in this run (0 or missing is unlimited).
    /// Each address gets exactly one outcome, in expansion order; running out
    /// of relays or failing a send never stops the run.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Configuration`] when `relays` is empty. Nothing is
    /// sent in that case.
    #[tracing::instrument(skip_all, fields(relays = relays.len(), carriers = carriers.len(), numbers = numbers.len()))]
    pub async fn dispatch(
        &self,
        message: &OutboundMessage,
        carriers: &[String],
        numbers: &[String],
        relays: Vec<RelayCredential>,
        caps: &[u32],
    ) -> Result<DispatchReport, DispatchError> {
        if relays.is_empty() {
            return Err(DispatchError::Configuration(
                "At least one SMTP configuration is required".to_string(),
            ));
        }

        let relays = relays
            .into_iter()
            .map(|mut relay| {
                if !relay.enabled {
                    internal!(level = DEBUG, relay = %relay.host, "Enabling relay supplied as disabled");
                }
                relay.enabled = true;
                relay
            })
            .collect();

        let pool = RelayPool::new(relays, caps);
        let addresses = expand_addresses(&self.carriers, carriers, numbers);

        tracing::info!(addresses = addresses.len(), "Dispatching");

        let concurrency = self.settings.max_concurrent_sends.max(1);
        let outcomes: Vec<DispatchOutcome> = stream::iter(addresses)
            .map(|target| {
                let acquired = pool.acquire_next();
                self.deliver(message, target, acquired)
            })
            .buffered(concurrency)
            .collect()
            .await;

        let report = DispatchReport::new(outcomes);
        tracing::info!(
            total = report.summary.total,
            success = report.summary.success,
            failed = report.summary.failed,
            "Dispatch finished"
        );

        Ok(report)
    }

    async fn deliver(
        &self,
        message: &OutboundMessage,
        target: String,
        acquired: Option<AcquiredRelay>,
    ) -> DispatchOutcome {
        let Some(AcquiredRelay { credential, .. }) = acquired else {
            tracing::warn!(address = %target, "No relay available, all usage limits exceeded");
            return DispatchOutcome::no_relay(target);
        };

        let sent = match compose_envelope(message, &credential, &target) {
            Ok(envelope) => self.transport.send(&credential, &envelope).await,
            Err(e) => Err(e),
        };

        match sent {
            Ok(()) => {
                tracing::debug!(address = %target, relay = %credential.host, "Sent");
                DispatchOutcome::sent(target, credential.host.clone())
            }
            Err(error) => {
                tracing::warn!(address = %target, relay = %credential.host, %error, "Send failed");
                DispatchOutcome::failed(target, credential.host.clone(), error.to_string())
            }
        }
    }

    /// Checks that `relay` accepts a self-addressed test message, retrying
    /// with linear backoff per the configured probe policy.
    pub async fn test_connection(&self, relay: &RelayCredential) -> Result<(), ProbeError> {
        probe_relay(self.transport.as_ref(), relay, &self.settings.probe).await
    }
}
