use serde::{Deserialize, Serialize};

use crate::{ProbePolicy, RelayCredential};

/// Placeholder written over secrets before a request is archived.
pub const REDACTED: &str = "[REDACTED]";

/// Content shared by every message of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub subject: String,
    pub from_name: String,
    pub body: String,
}

/// A fully composed message for a single gateway address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub sender: String,
    pub recipient: String,
    /// RFC 5322 text, headers included.
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeStatus {
    Sent,
    Failed,
    NoRelayAvailable,
}

impl OutcomeStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Failed => "failed",
            Self::NoRelayAvailable => "no-relay-available",
        }
    }
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one gateway address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub target: String,
    /// Host of the relay used; absent when no relay was available.
    pub relay_host: Option<String>,
    pub status: OutcomeStatus,
    pub error: Option<String>,
}

impl DispatchOutcome {
    pub const fn sent(target: String, relay_host: String) -> Self {
        Self {
            target,
            relay_host: Some(relay_host),
            status: OutcomeStatus::Sent,
            error: None,
        }
    }

    pub const fn failed(target: String, relay_host: String, error: String) -> Self {
        Self {
            target,
            relay_host: Some(relay_host),
            status: OutcomeStatus::Failed,
            error: Some(error),
        }
    }

    pub const fn no_relay(target: String) -> Self {
        Self {
            target,
            relay_host: None,
            status: OutcomeStatus::NoRelayAvailable,
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Sent
    }
}

/// Aggregate counts of a run. `success + failed == total`, and
/// `failed_addresses` lists every non-sent target in run order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub failed_addresses: Vec<String>,
}

impl DispatchSummary {
    pub fn from_outcomes(outcomes: &[DispatchOutcome]) -> Self {
        let failed_addresses: Vec<String> = outcomes
            .iter()
            .filter(|outcome| !outcome.is_success())
            .map(|outcome| outcome.target.clone())
            .collect();

        Self {
            total: outcomes.len(),
            success: outcomes.len() - failed_addresses.len(),
            failed: failed_addresses.len(),
            failed_addresses,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    /// One entry per gateway address, in expansion order.
    pub outcomes: Vec<DispatchOutcome>,
    pub summary: DispatchSummary,
}

impl DispatchReport {
    pub fn new(outcomes: Vec<DispatchOutcome>) -> Self {
        let summary = DispatchSummary::from_outcomes(&outcomes);
        Self { outcomes, summary }
    }
}

/// Everything a caller supplies for one run.
///
/// Field names follow the JSON body of `POST /api/send`, so the same type
/// backs HTTP requests, CLI job files and the archived copy of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRequest {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub from_name: String,
    #[serde(default)]
    pub subject: String,
    /// Message body.
    #[serde(default)]
    pub letter: String,
    #[serde(default)]
    pub smtp_configs: Vec<RelayCredential>,
    /// Parallel to `smtp_configs`; missing entries mean unlimited.
    #[serde(default)]
    pub usage_limits: Vec<u32>,
    #[serde(default)]
    pub carriers: Vec<String>,
    #[serde(default)]
    pub numbers: Vec<String>,
}

impl DispatchRequest {
    pub fn message(&self) -> OutboundMessage {
        OutboundMessage {
            subject: self.subject.clone(),
            from_name: self.from_name.clone(),
            body: self.letter.clone(),
        }
    }

    /// A copy safe to write to disk: relay secrets and the API key are
    /// replaced with [`REDACTED`].
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.api_key.is_empty() {
            copy.api_key = REDACTED.to_string();
        }
        for relay in &mut copy.smtp_configs {
            if !relay.secret.is_empty() {
                relay.secret = REDACTED.to_string();
            }
        }
        copy
    }
}

/// Per-command SMTP timeouts, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SmtpTimeouts {
    #[serde(default = "default_connect_timeout")]
    pub connect_secs: u64,

    /// EHLO/HELO.
    #[serde(default = "default_ehlo_timeout")]
    pub ehlo_secs: u64,

    /// STARTTLS command and the TLS handshake.
    #[serde(default = "default_starttls_timeout")]
    pub starttls_secs: u64,

    #[serde(default = "default_auth_timeout")]
    pub auth_secs: u64,

    #[serde(default = "default_mail_from_timeout")]
    pub mail_from_secs: u64,

    #[serde(default = "default_rcpt_to_timeout")]
    pub rcpt_to_secs: u64,

    /// DATA command and message transmission.
    #[serde(default = "default_data_timeout")]
    pub data_secs: u64,

    #[serde(default = "default_quit_timeout")]
    pub quit_secs: u64,
}

impl Default for SmtpTimeouts {
    fn default() -> Self {
        Self {
            connect_secs: default_connect_timeout(),
            ehlo_secs: default_ehlo_timeout(),
            starttls_secs: default_starttls_timeout(),
            auth_secs: default_auth_timeout(),
            mail_from_secs: default_mail_from_timeout(),
            rcpt_to_secs: default_rcpt_to_timeout(),
            data_secs: default_data_timeout(),
            quit_secs: default_quit_timeout(),
        }
    }
}

const fn default_connect_timeout() -> u64 {
    30
}

const fn default_ehlo_timeout() -> u64 {
    30
}

const fn default_starttls_timeout() -> u64 {
    30
}

const fn default_auth_timeout() -> u64 {
    30
}

const fn default_mail_from_timeout() -> u64 {
    30
}

const fn default_rcpt_to_timeout() -> u64 {
    30
}

const fn default_data_timeout() -> u64 {
    120
}

const fn default_quit_timeout() -> u64 {
    10
}

/// Tunables of the dispatch engine, the `dispatch` section of the config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Name announced in EHLO.
    #[serde(default = "default_helo_domain")]
    pub helo_domain: String,

    /// Sends in flight at once. 1 means strictly sequential.
    #[serde(default = "default_max_concurrent_sends")]
    pub max_concurrent_sends: usize,

    /// Skip certificate verification after STARTTLS.
    #[serde(default)]
    pub accept_invalid_certs: bool,

    #[serde(default)]
    pub probe: ProbePolicy,

    #[serde(default)]
    pub smtp_timeouts: SmtpTimeouts,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            helo_domain: default_helo_domain(),
            max_concurrent_sends: default_max_concurrent_sends(),
            accept_invalid_certs: false,
            probe: ProbePolicy::default(),
            smtp_timeouts: SmtpTimeouts::default(),
        }
    }
}

fn default_helo_domain() -> String {
    "localhost".to_string()
}

const fn default_max_concurrent_sends() -> usize {
    1
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_summary_counts() {
        let outcomes = vec![
            DispatchOutcome::sent("1@a".to_string(), "r0".to_string()),
            DispatchOutcome::failed("2@a".to_string(), "r1".to_string(), "boom".to_string()),
            DispatchOutcome::no_relay("3@a".to_string()),
            DispatchOutcome::sent("4@a".to_string(), "r0".to_string()),
        ];

        let summary = DispatchSummary::from_outcomes(&outcomes);
        assert_eq!(
            summary,
            DispatchSummary {
                total: 4,
                success: 2,
                failed: 2,
                failed_addresses: vec!["2@a".to_string(), "3@a".to_string()],
            }
        );
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(DispatchReport::new(Vec::new()).summary, DispatchSummary::default());
    }

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&[
            OutcomeStatus::Sent,
            OutcomeStatus::Failed,
            OutcomeStatus::NoRelayAvailable,
        ])
        .unwrap();
        assert_eq!(json, r#"["sent","failed","no-relay-available"]"#);
        assert_eq!(OutcomeStatus::NoRelayAvailable.to_string(), "no-relay-available");
    }

    #[test]
    fn test_settings_defaults_from_partial_ron() {
        let settings: DispatchSettings =
            ron::from_str("(max_concurrent_sends: 4, smtp_timeouts: (data_secs: 60))").unwrap();
        assert_eq!(settings.max_concurrent_sends, 4);
        assert_eq!(settings.helo_domain, "localhost");
        assert_eq!(settings.smtp_timeouts.data_secs, 60);
        assert_eq!(settings.smtp_timeouts.auth_secs, 30);
        assert_eq!(settings.probe, ProbePolicy::default());
    }

    #[test]
    fn test_request_from_json_body() {
        let request: DispatchRequest = serde_json::from_str(
            r#"{
                "apiKey": "APIKEY-1",
                "fromName": "Ops",
                "subject": "Hi",
                "letter": "Body",
                "smtpConfigs": [{"host": "smtp.test", "port": 587, "username": "u", "password": "p", "from": "u@smtp.test"}],
                "usageLimits": [10],
                "carriers": ["att"],
                "numbers": ["5551234567"]
            }"#,
        )
        .unwrap();

        assert_eq!(request.smtp_configs[0].secret, "p");
        assert_eq!(request.usage_limits, vec![10]);
        assert_eq!(
            request.message(),
            OutboundMessage {
                subject: "Hi".to_string(),
                from_name: "Ops".to_string(),
                body: "Body".to_string(),
            }
        );
    }

    #[test]
    fn test_redacted_request_hides_secrets() {
        let request: DispatchRequest = serde_json::from_str(
            r#"{"apiKey": "APIKEY-1", "smtpConfigs": [
                {"host": "a", "port": 25, "password": "hunter2", "from": "a@a"},
                {"host": "b", "port": 25, "from": "b@b"}
            ]}"#,
        )
        .unwrap();

        let redacted = request.redacted();
        assert_eq!(redacted.api_key, REDACTED);
        assert_eq!(redacted.smtp_configs[0].secret, REDACTED);
        assert_eq!(redacted.smtp_configs[1].secret, "");
        assert_eq!(redacted.smtp_configs[0].host, "a");

        let json = serde_json::to_string(&redacted).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(!json.contains("APIKEY-1"));
    }
}
