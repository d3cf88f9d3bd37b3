//! Relay-pool rotation and bulk dispatch of text messages through carrier
//! email gateways.
//!
//! A run expands carriers × numbers into gateway addresses, takes a relay
//! from a per-run [`RelayPool`] for each address (respecting usage caps),
//! sends through a [`MailTransport`] and reports one [`DispatchOutcome`] per
//! address plus a [`DispatchSummary`].

mod carrier;
mod engine;
mod error;
pub mod pool;
mod probe;
mod relay;
mod transport;
mod types;

pub use carrier::CarrierDirectory;
pub use engine::{Dispatcher, compose_envelope, expand_addresses};
pub use error::{
    CarrierError, DispatchError, PermanentError, ProbeError, SystemError, TemporaryError,
    TransportError,
};
pub use pool::{AcquiredRelay, RelayPool, SlotUsage};
pub use probe::{PROBE_BODY, PROBE_SUBJECT, ProbePolicy, probe_envelope, probe_relay};
pub use relay::RelayCredential;
pub use transport::{MailTransport, SmtpTransport};
pub use types::{
    DispatchOutcome, DispatchReport, DispatchRequest, DispatchSettings, DispatchSummary,
    Envelope, OutboundMessage, OutcomeStatus, REDACTED, SmtpTimeouts,
};
