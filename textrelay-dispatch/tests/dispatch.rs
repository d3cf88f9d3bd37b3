#![allow(clippy::unwrap_used)]

mod support;

use std::{sync::Arc, time::Duration};

use pretty_assertions::assert_eq;
use support::{RecordingTransport, carriers, relay, relays, strings};
use textrelay_dispatch::{
    DispatchError, DispatchSettings, Dispatcher, OutboundMessage, OutcomeStatus,
};

fn message() -> OutboundMessage {
    OutboundMessage {
        subject: "Status".to_string(),
        from_name: "Ops".to_string(),
        body: "All clear".to_string(),
    }
}

fn dispatcher(transport: &Arc<RecordingTransport>, max_concurrent_sends: usize) -> Dispatcher {
    Dispatcher::new(
        carriers(),
        transport.clone(),
        DispatchSettings {
            max_concurrent_sends,
            ..DispatchSettings::default()
        },
    )
}

#[tokio::test]
async fn test_outcomes_follow_expansion_order() {
    let transport = Arc::new(RecordingTransport::new());
    let report = dispatcher(&transport, 1)
        .dispatch(
            &message(),
            &strings(&["att", "verizon"]),
            &strings(&["5551234567"]),
            relays(1),
            &[],
        )
        .await
        .unwrap();

    let targets: Vec<_> = report.outcomes.iter().map(|o| o.target.as_str()).collect();
    assert_eq!(targets, vec!["5551234567@txt.att.net", "5551234567@vtext.com"]);
    assert!(report.outcomes.iter().all(|o| o.status == OutcomeStatus::Sent));
    assert_eq!(report.summary.total, 2);
    assert_eq!(report.summary.success, 2);
    assert_eq!(transport.attempts(), 2);
}

#[tokio::test]
async fn test_zero_relays_is_a_configuration_error() {
    let transport = Arc::new(RecordingTransport::new());
    let result = dispatcher(&transport, 1)
        .dispatch(
            &message(),
            &strings(&["att"]),
            &strings(&["5551234567"]),
            Vec::new(),
            &[5],
        )
        .await;

    assert!(matches!(result, Err(DispatchError::Configuration(_))));
    assert_eq!(transport.attempts(), 0);
}

#[tokio::test]
async fn test_exhaustion_mid_run() {
    let transport = Arc::new(RecordingTransport::new());
    let numbers = strings(&["1", "2", "3", "4", "5"]);
    let report = dispatcher(&transport, 1)
        .dispatch(&message(), &strings(&["att"]), &numbers, relays(2), &[1, 1])
        .await
        .unwrap();

    let statuses: Vec<_> = report.outcomes.iter().map(|o| o.status).collect();
    assert_eq!(
        statuses,
        vec![
            OutcomeStatus::Sent,
            OutcomeStatus::Sent,
            OutcomeStatus::NoRelayAvailable,
            OutcomeStatus::NoRelayAvailable,
            OutcomeStatus::NoRelayAvailable,
        ]
    );
    assert!(report.outcomes[2..].iter().all(|o| o.relay_host.is_none()));
    assert_eq!(report.summary.success, 2);
    assert_eq!(report.summary.failed, 3);
    assert_eq!(
        report.summary.failed_addresses,
        strings(&["3@txt.att.net", "4@txt.att.net", "5@txt.att.net"])
    );
    assert_eq!(transport.attempts(), 2);
}

#[tokio::test]
async fn test_send_failures_do_not_stop_the_run() {
    let transport = Arc::new(RecordingTransport::new().fail_host("relay1"));
    let report = dispatcher(&transport, 1)
        .dispatch(
            &message(),
            &strings(&["att"]),
            &strings(&["1", "2", "3", "4"]),
            relays(2),
            &[],
        )
        .await
        .unwrap();

    let hosts: Vec<_> = report
        .outcomes
        .iter()
        .map(|o| o.relay_host.clone().unwrap())
        .collect();
    assert_eq!(hosts, strings(&["relay0", "relay1", "relay0", "relay1"]));

    let failed = &report.outcomes[1];
    assert_eq!(failed.status, OutcomeStatus::Failed);
    assert!(failed.error.as_deref().unwrap().contains("relay1 refused"));
    assert_eq!(report.summary.failed_addresses, strings(&["2@txt.att.net", "4@txt.att.net"]));
    assert_eq!(report.summary.success + report.summary.failed, report.summary.total);
}

#[tokio::test]
async fn test_failed_send_still_uses_the_cap() {
    let transport = Arc::new(RecordingTransport::new().fail_recipient("1@txt.att.net"));
    let report = dispatcher(&transport, 1)
        .dispatch(&message(), &strings(&["att"]), &strings(&["1", "2", "3"]), relays(1), &[2])
        .await
        .unwrap();

    let statuses: Vec<_> = report.outcomes.iter().map(|o| o.status).collect();
    assert_eq!(
        statuses,
        vec![
            OutcomeStatus::Failed,
            OutcomeStatus::Sent,
            OutcomeStatus::NoRelayAvailable,
        ]
    );
    assert_eq!(transport.attempts(), 2);
}

#[tokio::test]
async fn test_disabled_relays_are_enabled_for_the_run() {
    let transport = Arc::new(RecordingTransport::new());
    let mut disabled = relay("only");
    disabled.enabled = false;

    let report = dispatcher(&transport, 1)
        .dispatch(&message(), &strings(&["att"]), &strings(&["1"]), vec![disabled], &[])
        .await
        .unwrap();

    assert_eq!(report.outcomes[0].status, OutcomeStatus::Sent);
    assert_eq!(report.outcomes[0].relay_host.as_deref(), Some("only"));
}

#[tokio::test]
async fn test_empty_expansion_is_a_normal_run() {
    let transport = Arc::new(RecordingTransport::new());
    let dispatcher = dispatcher(&transport, 1);

    let unknown = dispatcher
        .dispatch(&message(), &strings(&["sprint"]), &strings(&["1"]), relays(1), &[])
        .await
        .unwrap();
    assert!(unknown.outcomes.is_empty());
    assert_eq!(unknown.summary.total, 0);

    let no_numbers = dispatcher
        .dispatch(&message(), &strings(&["att"]), &[], relays(1), &[])
        .await
        .unwrap();
    assert!(no_numbers.outcomes.is_empty());
    assert_eq!(transport.attempts(), 0);
}

#[tokio::test]
async fn test_each_run_gets_a_fresh_pool() {
    let transport = Arc::new(RecordingTransport::new());
    let dispatcher = dispatcher(&transport, 1);

    for _ in 0..2 {
        let report = dispatcher
            .dispatch(&message(), &strings(&["att"]), &strings(&["1", "2"]), relays(1), &[1])
            .await
            .unwrap();
        assert_eq!(report.outcomes[0].status, OutcomeStatus::Sent);
        assert_eq!(report.outcomes[1].status, OutcomeStatus::NoRelayAvailable);
    }
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_sends_keep_expansion_order() {
    let transport = Arc::new(
        RecordingTransport::new()
            .delay_recipient("1@txt.att.net", Duration::from_secs(4))
            .delay_recipient("2@txt.att.net", Duration::from_secs(1))
            .delay_recipient("3@txt.att.net", Duration::from_secs(3)),
    );

    let start = tokio::time::Instant::now();
    let report = dispatcher(&transport, 4)
        .dispatch(
            &message(),
            &strings(&["att"]),
            &strings(&["1", "2", "3", "4"]),
            relays(3),
            &[],
        )
        .await
        .unwrap();
    let elapsed = start.elapsed();

    let targets: Vec<_> = report.outcomes.iter().map(|o| o.target.as_str()).collect();
    assert_eq!(
        targets,
        vec!["1@txt.att.net", "2@txt.att.net", "3@txt.att.net", "4@txt.att.net"]
    );

    let hosts: Vec<_> = report
        .outcomes
        .iter()
        .map(|o| o.relay_host.as_deref().unwrap())
        .collect();
    assert_eq!(hosts, vec!["relay0", "relay1", "relay2", "relay0"]);

    assert!(elapsed < Duration::from_secs(8), "sends ran sequentially: {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_default_is_sequential() {
    let transport = Arc::new(
        RecordingTransport::new()
            .delay_recipient("1@txt.att.net", Duration::from_secs(2))
            .delay_recipient("2@txt.att.net", Duration::from_secs(2)),
    );

    let start = tokio::time::Instant::now();
    dispatcher(&transport, DispatchSettings::default().max_concurrent_sends)
        .dispatch(&message(), &strings(&["att"]), &strings(&["1", "2"]), relays(2), &[])
        .await
        .unwrap();

    assert!(start.elapsed() >= Duration::from_secs(4));
}

#[tokio::test]
async fn test_concurrent_run_respects_caps() {
    let transport = Arc::new(RecordingTransport::new());
    let numbers: Vec<String> = (0..20).map(|n| n.to_string()).collect();

    let report = dispatcher(&transport, 8)
        .dispatch(&message(), &strings(&["att"]), &numbers, relays(3), &[3, 2, 4])
        .await
        .unwrap();

    assert_eq!(report.summary.success, 9);
    assert!(
        report.outcomes[9..]
            .iter()
            .all(|o| o.status == OutcomeStatus::NoRelayAvailable)
    );
}
