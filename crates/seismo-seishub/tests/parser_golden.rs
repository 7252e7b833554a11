//! Golden-file regression test for the SEISHUB message parser, against a
//! fixture shaped like a real archived quarry-blast report rather than
//! an inline string literal.

use chrono::{TimeZone, Utc};
use seismo_core::{EventType, Quality};
use seismo_seishub::parse_msg;

#[test]
fn parses_the_documented_fixture_message() {
    let body = include_str!("fixtures/asb2023eesfwx.html");
    let msg = parse_msg(body).expect("fixture message parses");

    assert_eq!(msg.event_id, "asb2023eesfwx");
    assert_eq!(
        msg.focus_time,
        Utc.with_ymd_and_hms(2023, 3, 1, 5, 13, 16).unwrap()
    );
    assert_eq!(msg.latitude, 54.71);
    assert_eq!(msg.longitude, 83.67);
    assert_eq!(msg.magnitude, 3.3);
    assert_eq!(msg.event_type, EventType::QuarryBlast);
    assert_eq!(msg.quality, Quality::Excellent);
}
