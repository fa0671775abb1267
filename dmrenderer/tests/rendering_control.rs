mod common;

use std::sync::Arc;

use common::Harness;
use dmrenderer::events::{MUTE, VOLUME};
use dmrenderer::{
    EventService, EventSink, LastChangeSink, PlaybackEvent, PlayerCommand, UpnpErrorCode,
};

#[test]
fn test_volume_round_trip() {
    let h = Harness::new(&[0], 50);
    let rcs = h.renderer.rendering_control();
    for v in 0..=100u16 {
        rcs.set_volume(0, "Master", v).unwrap();
        assert_eq!(rcs.get_volume(0, "Master").unwrap(), v);
        assert_eq!(rcs.get_mute(0, "Master").unwrap(), v == 0);
    }
}

#[test]
fn test_mute_restores_previous_level() {
    for v in [37u16, 100] {
        let h = Harness::new(&[0], 50);
        let rcs = h.renderer.rendering_control();

        rcs.set_volume(0, "Master", v).unwrap();
        rcs.set_mute(0, "Master", true).unwrap();
        assert!(rcs.get_mute(0, "Master").unwrap());
        assert_eq!(rcs.get_volume(0, "Master").unwrap(), 0);

        rcs.set_mute(0, "Master", false).unwrap();
        assert!(!rcs.get_mute(0, "Master").unwrap());
        assert_eq!(rcs.get_volume(0, "Master").unwrap(), v);
    }
}

#[test]
fn test_mute_round_trip_at_zero() {
    let h = Harness::new(&[0], 0);
    let rcs = h.renderer.rendering_control();

    rcs.set_volume(0, "Master", 0).unwrap();
    rcs.set_mute(0, "Master", true).unwrap();
    rcs.set_mute(0, "Master", false).unwrap();
    assert_eq!(rcs.get_volume(0, "Master").unwrap(), 0);
    assert!(rcs.get_mute(0, "Master").unwrap());
}

#[test]
fn test_redundant_mute_requests() {
    let mut h = Harness::new(&[0], 40);
    let rcs = h.renderer.rendering_control().clone();

    rcs.set_mute(0, "Master", false).unwrap();
    assert!(h.drain_events().is_empty());
    assert!(h.drain_commands().is_empty());

    rcs.set_mute(0, "Master", true).unwrap();
    h.drain_events();
    h.drain_commands();
    rcs.set_mute(0, "Master", true).unwrap();
    assert!(h.drain_events().is_empty());
    assert!(h.drain_commands().is_empty());
    assert_eq!(rcs.get_volume(0, "Master").unwrap(), 0);
}

#[test]
fn test_zero_crossing_events() {
    let mut h = Harness::new(&[0], 50);
    let rcs = h.renderer.rendering_control().clone();

    rcs.set_volume(0, "Master", 0).unwrap();
    let batches = h.drain_events();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].service, EventService::RenderingControl);
    assert_eq!(batches[0].value_of(VOLUME), Some("0"));
    assert_eq!(batches[0].value_of(MUTE), Some("1"));

    rcs.set_volume(0, "Master", 20).unwrap();
    let batches = h.drain_events();
    assert_eq!(batches[0].value_of(VOLUME), Some("20"));
    assert_eq!(batches[0].value_of(MUTE), Some("0"));

    rcs.set_volume(0, "Master", 30).unwrap();
    let batches = h.drain_events();
    assert_eq!(batches[0].value_of(VOLUME), Some("30"));
    assert_eq!(batches[0].value_of(MUTE), None);

    rcs.set_volume(0, "Master", 0).unwrap();
    rcs.set_volume(0, "Master", 0).unwrap();
    let batches = h.drain_events();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].value_of(MUTE), Some("1"));
    assert_eq!(batches[1].value_of(VOLUME), Some("0"));
    assert_eq!(batches[1].value_of(MUTE), None);

    assert_eq!(
        h.drain_commands(),
        vec![
            PlayerCommand::SetVolume { volume: 0.0 },
            PlayerCommand::SetVolume { volume: 0.2 },
            PlayerCommand::SetVolume { volume: 0.3 },
            PlayerCommand::SetVolume { volume: 0.0 },
            PlayerCommand::SetVolume { volume: 0.0 },
        ]
    );
}

#[test]
fn test_channel_validation() {
    let mut h = Harness::new(&[0], 50);
    let rcs = h.renderer.rendering_control().clone();

    for channel in ["LF", "master", ""] {
        assert_eq!(
            rcs.set_volume(0, channel, 10).unwrap_err().code,
            UpnpErrorCode::ArgumentValueInvalid
        );
        assert_eq!(rcs.get_volume(0, channel).unwrap_err().code.code(), 600);
        assert_eq!(rcs.get_mute(0, channel).unwrap_err().code.code(), 600);
        assert_eq!(rcs.set_mute(0, channel, true).unwrap_err().code.code(), 600);
    }
    // the instance is resolved before the channel
    assert_eq!(rcs.get_volume(9, "RF").unwrap_err().code.code(), 702);

    assert!(h.drain_events().is_empty());
    assert!(h.drain_commands().is_empty());
}

#[test]
fn test_volume_out_of_range() {
    let mut h = Harness::new(&[0], 50);
    let rcs = h.renderer.rendering_control().clone();

    let fault = rcs.set_volume(0, "Master", 101).unwrap_err();
    assert_eq!(fault.code, UpnpErrorCode::ArgumentValueOutOfRange);
    assert_eq!(fault.code.code(), 601);
    assert_eq!(rcs.get_volume(0, "Master").unwrap(), 50);
    assert!(h.drain_commands().is_empty());
}

#[test]
fn test_unknown_instance() {
    let h = Harness::new(&[0], 50);
    let rcs = h.renderer.rendering_control();

    assert_eq!(
        rcs.get_volume(2, "Master").unwrap_err().code,
        UpnpErrorCode::RcsInvalidInstanceId
    );
    assert_eq!(rcs.set_volume(2, "Master", 10).unwrap_err().code.code(), 702);
    assert_eq!(rcs.get_mute(2, "Master").unwrap_err().code.code(), 702);
    assert_eq!(rcs.set_mute(2, "Master", true).unwrap_err().code.code(), 702);
}

#[test]
fn test_player_volume_report() {
    let mut h = Harness::new(&[0], 50);
    h.confirm(0, PlaybackEvent::Volume(0.8));

    assert_eq!(h.instance(0).volume_percent(), 80);
    let batches = h.drain_events();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].value_of(VOLUME), Some("80"));
    assert!(h.drain_commands().is_empty());

    // same level again: nothing to report
    h.confirm(0, PlaybackEvent::Volume(0.8));
    assert!(h.drain_events().is_empty());
}

#[test]
fn test_lastchange_document() {
    let mut h = Harness::new(&[0], 50);
    let sink = Arc::new(LastChangeSink::new());

    let rcs = h.renderer.rendering_control().clone();
    rcs.set_volume(0, "Master", 37).unwrap();
    rcs.set_mute(0, "Master", true).unwrap();

    for batch in h.drain_events() {
        sink.publish(batch).unwrap();
    }

    let xml = sink.flush(EventService::RenderingControl).unwrap();
    assert_eq!(
        xml,
        r#"<Event xmlns="urn:schemas-upnp-org:metadata-1-0/RCS/"><InstanceID val="0"><Volume channel="Master" val="0"/><Mute channel="Master" val="1"/></InstanceID></Event>"#
    );
}
