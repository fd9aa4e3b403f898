//! Polling cycle behaviour: ordering, exclusion and per-point failures.

mod common;

use std::time::Duration;

use common::{Harness, RecordingSink, Reply, ScriptedTransport, StaticSource, present_value};
use fieldsight_bridge_framework::{Format, TelemetryValue};
use fieldsight_common::encode;
use mqtt_bridge_bacnet::bacnet::{ApplicationValue, ObjectIdentifier, ObjectType};
use mqtt_bridge_bacnet::poller::{PollerError, TickOutcome};

fn object(object_type: ObjectType, instance: u32) -> ObjectIdentifier {
    ObjectIdentifier::new(object_type, instance)
}

#[tokio::test(start_paused = true)]
async fn test_cycle_reads_and_publishes_in_point_order() {
    let a = object(ObjectType::AnalogValue, 1);
    let b = object(ObjectType::AnalogValue, 2);
    let c = object(ObjectType::AnalogValue, 3);

    let transport = ScriptedTransport::new()
        .reply(a, Duration::from_millis(10), Reply::Value(ApplicationValue::Real(1.0)))
        .reply(b, Duration::from_secs(2), Reply::Value(ApplicationValue::Real(2.0)))
        .reply(c, Duration::ZERO, Reply::Value(ApplicationValue::Real(3.0)));

    let h = Harness::new(
        StaticSource::new([
            present_value("A", ObjectType::AnalogValue, 1),
            present_value("B", ObjectType::AnalogValue, 2),
            present_value("C", ObjectType::AnalogValue, 3),
        ]),
        transport,
        RecordingSink::new(),
    );

    let TickOutcome::Completed(report) = h.poller.tick().await.unwrap() else {
        panic!("expected a completed cycle");
    };

    assert_eq!(h.transport.requests(), vec![a, b, c]);
    assert_eq!(h.transport.max_in_flight(), 1, "requests must never overlap");
    assert_eq!(h.sink.measurements(), vec!["A", "B", "C"]);
    assert_eq!(
        h.sink
            .messages()
            .into_iter()
            .map(|m| m.value)
            .collect::<Vec<_>>(),
        vec![
            TelemetryValue::Real(1.0),
            TelemetryValue::Real(2.0),
            TelemetryValue::Real(3.0)
        ]
    );
    assert_eq!(report.points, 3);
    assert_eq!(report.errors, 0);
    assert_eq!(report.published.success, 3);
    assert!(report.elapsed >= Duration::from_millis(2010));
    assert!(!h.poller.state().is_running());
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_published_and_cycle_continues() {
    let p1 = object(ObjectType::PositiveIntegerValue, 1);
    let p2 = object(ObjectType::AnalogInput, 2);

    let transport = ScriptedTransport::new()
        .reply(p1, Duration::ZERO, Reply::Value(ApplicationValue::Unsigned(42)))
        .reply(p2, Duration::ZERO, Reply::Timeout(Duration::from_secs(3)));

    let h = Harness::new(
        StaticSource::new([
            present_value("P1", ObjectType::PositiveIntegerValue, 1),
            present_value("P2", ObjectType::AnalogInput, 2),
        ]),
        transport,
        RecordingSink::new(),
    );

    let outcome = h.poller.tick().await.unwrap();
    let TickOutcome::Completed(report) = outcome else {
        panic!("expected a completed cycle");
    };
    assert_eq!(report.errors, 1);

    let messages = h.sink.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].measurement, "P1");
    assert_eq!(messages[0].value, TelemetryValue::Unsigned(42));
    assert_eq!(messages[1].measurement, "P2");
    assert_eq!(
        messages[1].value,
        TelemetryValue::Text("no response within 3s".into())
    );

    let json: serde_json::Value =
        serde_json::from_slice(&encode(&messages[0], Format::Json).unwrap()).unwrap();
    assert_eq!(json["value"], 42);

    // One token for the point-set fetch, one per publish.
    assert_eq!(h.minter.minted(), 3);
    assert_eq!(h.sink.tokens(), vec!["token-2", "token-3"]);
}

#[tokio::test]
async fn test_unknown_datatype_is_a_per_point_error() {
    let device = object(ObjectType::Device, 1030);
    let temp = object(ObjectType::AnalogInput, 1);

    let transport = ScriptedTransport::new()
        .reply(device, Duration::ZERO, Reply::Value(ApplicationValue::Real(1.0)))
        .reply(temp, Duration::ZERO, Reply::Value(ApplicationValue::Real(21.5)));

    let h = Harness::new(
        StaticSource::new([
            present_value("dev-pv", ObjectType::Device, 1030),
            present_value("temp", ObjectType::AnalogInput, 1),
        ]),
        transport,
        RecordingSink::new(),
    );

    h.poller.tick().await.unwrap();

    let messages = h.sink.messages();
    assert_eq!(
        messages[0].value,
        TelemetryValue::Text("no datatype known for presentValue of device".into())
    );
    assert_eq!(messages[1].value, TelemetryValue::Real(21.5));
}

#[tokio::test]
async fn test_type_mismatch_is_a_per_point_error() {
    let av = object(ObjectType::AnalogValue, 9);
    let transport = ScriptedTransport::new().reply(
        av,
        Duration::ZERO,
        Reply::Value(ApplicationValue::CharacterString("n/a".into())),
    );

    let h = Harness::new(
        StaticSource::new([present_value("av9", ObjectType::AnalogValue, 9)]),
        transport,
        RecordingSink::new(),
    );

    h.poller.tick().await.unwrap();
    let messages = h.sink.messages();
    assert!(messages[0].value.is_text());
    assert_eq!(
        messages[0].value,
        TelemetryValue::Text("expected real value, got character-string".into())
    );
}

#[tokio::test]
async fn test_overlapping_tick_is_skipped() {
    let a = object(ObjectType::BinaryInput, 1);
    let transport = ScriptedTransport::gated().reply(
        a,
        Duration::ZERO,
        Reply::Value(ApplicationValue::Enumerated(1)),
    );

    let h = Harness::new(
        StaticSource::new([present_value("fan", ObjectType::BinaryInput, 1)]),
        transport,
        RecordingSink::new(),
    );

    let first = {
        let poller = h.poller.clone();
        tokio::spawn(async move { poller.tick().await })
    };
    h.transport.started.notified().await;
    assert!(h.poller.state().is_running());

    let second = h.poller.tick().await.unwrap();
    assert_eq!(second, TickOutcome::Skipped);
    assert_eq!(h.source.fetches(), 2, "a skipped tick still fetches the point set");
    assert_eq!(h.transport.requests().len(), 1);
    assert!(h.sink.messages().is_empty());

    h.transport.open_gate(1);
    let first = first.await.unwrap().unwrap();
    assert!(matches!(first, TickOutcome::Completed(_)));
    assert_eq!(h.sink.measurements(), vec!["fan"]);
    assert_eq!(h.sink.messages()[0].value, TelemetryValue::Text("active".into()));

    h.transport.open_gate(1);
    let third = h.poller.tick().await.unwrap();
    assert!(matches!(third, TickOutcome::Completed(_)));
}

#[tokio::test]
async fn test_panicking_cycle_releases_state() {
    let a = object(ObjectType::AnalogInput, 1);
    let transport = ScriptedTransport::new().reply(
        a,
        Duration::ZERO,
        Reply::PanicOnce(ApplicationValue::Real(5.0)),
    );

    let h = Harness::new(
        StaticSource::new([present_value("a", ObjectType::AnalogInput, 1)]),
        transport,
        RecordingSink::new(),
    );

    let poller = h.poller.clone();
    let crashed = tokio::spawn(async move { poller.tick().await }).await;
    assert!(crashed.unwrap_err().is_panic());
    assert!(!h.poller.state().is_running());

    let outcome = h.poller.tick().await.unwrap();
    assert!(matches!(outcome, TickOutcome::Completed(_)));
    assert_eq!(h.sink.messages()[0].value, TelemetryValue::Real(5.0));
}

#[tokio::test]
async fn test_fetch_failure_reads_nothing() {
    let h = Harness::new(
        StaticSource::failing(),
        ScriptedTransport::new(),
        RecordingSink::new(),
    );

    let err = tokio_test::assert_err!(h.poller.tick().await);
    assert!(matches!(err, PollerError::Fetch(_)));
    assert!(h.transport.requests().is_empty());
    assert!(h.sink.messages().is_empty());
    assert_eq!(h.minter.minted(), 1);
    assert!(!h.poller.state().is_running());
}

#[tokio::test]
async fn test_publish_failure_does_not_stop_later_points() {
    let a = object(ObjectType::AnalogInput, 1);
    let b = object(ObjectType::AnalogInput, 2);
    let transport = ScriptedTransport::new()
        .reply(a, Duration::ZERO, Reply::Value(ApplicationValue::Real(1.0)))
        .reply(b, Duration::ZERO, Reply::Value(ApplicationValue::Real(2.0)));

    let h = Harness::new(
        StaticSource::new([
            present_value("a", ObjectType::AnalogInput, 1),
            present_value("b", ObjectType::AnalogInput, 2),
        ]),
        transport,
        RecordingSink::rejecting("a"),
    );

    let TickOutcome::Completed(report) = h.poller.tick().await.unwrap() else {
        panic!("expected a completed cycle");
    };
    assert_eq!(report.published.success, 1);
    assert_eq!(report.published.failed, 1);
    assert_eq!(h.sink.measurements(), vec!["b"]);
    assert_eq!(h.minter.minted(), 3);
}

#[tokio::test]
async fn test_empty_point_set_completes() {
    let h = Harness::new(
        StaticSource::new([]),
        ScriptedTransport::new(),
        RecordingSink::new(),
    );

    let outcome = tokio_test::assert_ok!(h.poller.tick().await);
    let TickOutcome::Completed(report) = outcome else {
        panic!("expected a completed cycle");
    };
    assert_eq!(report.points, 0);
    assert_eq!(report.published.total(), 0);
    assert_eq!(h.minter.minted(), 1);
}
