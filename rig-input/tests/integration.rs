// Copyright 2025 rig Authors
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for the input subsystem
//!
//! The codec and gesture sequencer are exercised against in-memory
//! sinks; the recorded byte stream is decoded back into records and
//! checked against the kernel-facing contracts.

use std::io::{self, Write};
use std::time::Instant;

use rig_input::classifier::{self, DeviceKind};
use rig_input::event::{abs, btn, ev, syn, RawInputEvent};
use rig_input::{codec, gesture, InputError};

/// Decode a recorded byte stream into `(type, code, value)` triples.
fn decode(buf: &[u8]) -> Vec<(u16, u16, i32)> {
    assert_eq!(buf.len() % 24, 0, "stream is not whole records");
    buf.chunks_exact(24)
        .map(|chunk| {
            (
                u16::from_ne_bytes([chunk[16], chunk[17]]),
                u16::from_ne_bytes([chunk[18], chunk[19]]),
                i32::from_ne_bytes([chunk[20], chunk[21], chunk[22], chunk[23]]),
            )
        })
        .collect()
}

fn is_syn_report(record: &(u16, u16, i32)) -> bool {
    record.0 == ev::SYN && record.1 == syn::REPORT
}

/// Sink that fails every write after the first `limit` records.
struct FailAfter {
    written: Vec<u8>,
    limit: usize,
}

impl FailAfter {
    fn new(limit: usize) -> Self {
        Self {
            written: Vec::new(),
            limit,
        }
    }
}

impl Write for FailAfter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written.len() / 24 >= self.limit {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device gone"));
        }
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// Codec Tests
// ============================================================================

#[test]
fn move_writes_three_records() {
    let mut out = Vec::new();
    codec::position_mt(&mut out, 100, 200).unwrap();
    codec::syn_report(&mut out).unwrap();

    let records = decode(&out);
    assert_eq!(
        records,
        vec![
            (ev::ABS, abs::MT_POSITION_X, 100),
            (ev::ABS, abs::MT_POSITION_Y, 200),
            (ev::SYN, syn::REPORT, 0),
        ]
    );
}

#[test]
fn key_is_press_then_release() {
    let mut out = Vec::new();
    codec::key(&mut out, 30).unwrap();
    codec::syn_report(&mut out).unwrap();

    let records = decode(&out);
    assert_eq!(
        records,
        vec![(ev::KEY, 30, 1), (ev::KEY, 30, 0), (ev::SYN, syn::REPORT, 0)]
    );
}

#[test]
fn button_down_then_up_sequences() {
    // down
    let mut down = Vec::new();
    codec::tracking(&mut down, 100).unwrap();
    codec::touch_button(&mut down, 1).unwrap();
    codec::syn_report(&mut down).unwrap();
    assert_eq!(
        decode(&down),
        vec![
            (ev::ABS, abs::MT_TRACKING_ID, 100),
            (ev::KEY, btn::TOUCH, 1),
            (ev::SYN, syn::REPORT, 0),
        ]
    );

    // up
    let mut up = Vec::new();
    codec::tracking(&mut up, -1).unwrap();
    codec::touch_button(&mut up, 0).unwrap();
    codec::syn_report(&mut up).unwrap();
    assert_eq!(
        decode(&up),
        vec![
            (ev::ABS, abs::MT_TRACKING_ID, -1),
            (ev::KEY, btn::TOUCH, 0),
            (ev::SYN, syn::REPORT, 0),
        ]
    );
}

#[test]
fn record_timestamps_are_zero() {
    let record = RawInputEvent::new(ev::KEY, 30, 1);
    assert_eq!(record.sec, 0);
    assert_eq!(record.usec, 0);
}

// ============================================================================
// Gesture Tests
// ============================================================================

#[test]
fn touch_ends_with_syn_report_and_balances_btn_touch() {
    let mut out = Vec::new();
    gesture::touch(&mut out, 50, 60, 0).unwrap();

    let records = decode(&out);
    assert!(is_syn_report(records.last().unwrap()));

    let downs = records
        .iter()
        .filter(|r| r.0 == ev::KEY && r.1 == btn::TOUCH && r.2 == 1)
        .count();
    let ups = records
        .iter()
        .filter(|r| r.0 == ev::KEY && r.1 == btn::TOUCH && r.2 == 0)
        .count();
    assert_eq!(downs, 1);
    assert_eq!(ups, 1);

    // both positions carried, multi-touch and absolute
    assert!(records.contains(&(ev::ABS, abs::MT_POSITION_X, 50)));
    assert!(records.contains(&(ev::ABS, abs::X, 50)));
    assert!(records.contains(&(ev::ABS, abs::Y, 60)));
}

#[test]
fn touch_holds_for_duration() {
    let mut out = Vec::new();
    let started = Instant::now();
    gesture::touch(&mut out, 1, 1, 1).unwrap();
    assert!(started.elapsed().as_secs() >= 1);
}

#[test]
fn swipe_two_steps_frames_and_timing() {
    let mut out = Vec::new();
    let started = Instant::now();
    gesture::swipe(&mut out, 0, 0, 10, 20, 2).unwrap();
    // two interpolated steps sleep 500 ms each
    assert!(started.elapsed().as_millis() >= 1000);

    let records = decode(&out);
    assert!(is_syn_report(records.last().unwrap()));

    // tracking goes down before it comes up, and comes up exactly once
    let first_down = records
        .iter()
        .position(|r| r.0 == ev::ABS && r.1 == abs::MT_TRACKING_ID && r.2 == 100)
        .expect("no tracking start");
    let ups: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.0 == ev::ABS && r.1 == abs::MT_TRACKING_ID && r.2 == -1)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(ups.len(), 1);
    assert!(first_down < ups[0]);
    let last_down = records
        .iter()
        .rposition(|r| r.0 == ev::ABS && r.1 == abs::MT_TRACKING_ID && r.2 == 100)
        .unwrap();
    assert!(last_down < ups[0]);

    // header major is 2, footer zeroes the contact ellipse
    assert_eq!(
        records
            .iter()
            .find(|r| r.0 == ev::ABS && r.1 == abs::MT_TOUCH_MAJOR),
        Some(&(ev::ABS, abs::MT_TOUCH_MAJOR, 2))
    );
    assert!(records.contains(&(ev::ABS, abs::MT_TOUCH_MAJOR, 0)));
    assert!(records.contains(&(ev::ABS, abs::MT_PRESSURE, 0)));

    // the final position frame lands exactly on the destination
    let last_x = records
        .iter()
        .rposition(|r| r.0 == ev::ABS && r.1 == abs::MT_POSITION_X)
        .unwrap();
    assert_eq!(records[last_x].2, 10);
    let last_y = records
        .iter()
        .rposition(|r| r.0 == ev::ABS && r.1 == abs::MT_POSITION_Y)
        .unwrap();
    assert_eq!(records[last_y].2, 20);
}

#[test]
fn swipe_rejects_zero_steps() {
    let mut out = Vec::new();
    let result = gesture::swipe(&mut out, 0, 0, 10, 10, 0);
    assert!(matches!(result, Err(InputError::BadInput(_))));
    assert!(out.is_empty(), "no events may be written for a rejected swipe");
}

#[test]
fn text_types_each_code_with_delay() {
    let mut out = Vec::new();
    let started = Instant::now();
    gesture::text(&mut out, &[30, 48, 46]).unwrap();
    assert!(started.elapsed().as_secs() >= 3);

    let records = decode(&out);
    assert_eq!(records.len(), 9);
    for chunk in records.chunks(3) {
        assert_eq!(chunk[0].0, ev::KEY);
        assert_eq!(chunk[0].2, 1);
        assert_eq!(chunk[1].0, ev::KEY);
        assert_eq!(chunk[1].2, 0);
        assert!(is_syn_report(&chunk[2]));
    }
}

#[test]
fn text_halts_on_first_failure() {
    // room for one full keystroke (3 records), then the device breaks
    let mut out = FailAfter::new(3);
    let result = gesture::text(&mut out, &[30, 48, 46]);
    assert!(matches!(result, Err(InputError::Io(_))));
    assert_eq!(out.written.len() / 24, 3);
}

#[test]
fn gesture_failure_leaves_no_footer() {
    // enough room for the touch-down frame only
    let mut out = FailAfter::new(6);
    let result = gesture::touch(&mut out, 5, 5, 0);
    assert!(result.is_err());
    let records = decode(&out.written);
    // no release must have been attempted after the failure
    assert!(!records.contains(&(ev::KEY, btn::TOUCH, 0)));
}

// ============================================================================
// Classifier Tests
// ============================================================================

#[test]
fn uinput_defaults_cover_the_triple() {
    let mappings = classifier::uinput_defaults();
    assert_eq!(mappings.len(), 3);
    assert_eq!(classifier::resolve_event(&mappings, DeviceKind::Mouse), Some(0));
    assert_eq!(classifier::resolve_event(&mappings, DeviceKind::Keyboard), Some(1));
    assert_eq!(
        classifier::resolve_event(&mappings, DeviceKind::Touchscreen),
        Some(2)
    );
    assert_eq!(classifier::resolve_event(&mappings, DeviceKind::Trackpad), None);
}

#[test]
fn resolve_event_on_empty_listing() {
    assert_eq!(classifier::resolve_event(&[], DeviceKind::Mouse), None);
}

#[test]
fn listing_parse_discards_unclassified_names() {
    let listing = "\
I: Bus=0003 Vendor=80ee Product=0021 Version=0100
N: Name=\"VirtualBox USB Tablet\"
P: Phys=usb-0000:00:06.0-1/input0
S: Sysfs=/devices/pci0000:00/usb1/input7
H: Handlers=mouse0 event7

I: Bus=0011 Vendor=0001 Product=0001 Version=ab41
N: Name=\"AT Translated Set 2 Keyboard\"
P: Phys=isa0060/serio0/input0
S: Sysfs=/devices/platform/i8042/serio0/input/input3
H: Handlers=sysrq kbd event3
";
    let mappings = classifier::parse_device_listing(listing.as_bytes()).unwrap();
    // "tablet" matches no substring rule; only the keyboard survives
    assert_eq!(mappings.len(), 1);
    assert_eq!(mappings[0].event_number, 3);
    assert_eq!(mappings[0].kind, DeviceKind::Keyboard);
    assert_eq!(mappings[0].relevance, 1);
}

#[test]
fn listing_parse_orders_and_ranks() {
    let listing = "\
N: Name=\"USB Mouse\"
S: Sysfs=/devices/usb/input9

N: Name=\"Builtin Keyboard\"
S: Sysfs=/devices/platform/input2

N: Name=\"Second Mouse\"
S: Sysfs=/devices/usb/input5
";
    let mappings = classifier::parse_device_listing(listing.as_bytes()).unwrap();
    assert_eq!(mappings.len(), 3);
    // sorted by (event_number, relevance)
    assert_eq!(mappings[0].event_number, 2);
    assert_eq!(mappings[1].event_number, 5);
    assert_eq!(mappings[2].event_number, 9);
    // first mouse encountered outranks the second
    assert_eq!(mappings[2].relevance, 1);
    assert_eq!(mappings[1].relevance, 2);
    // resolution returns the sort-order winner
    assert_eq!(classifier::resolve_event(&mappings, DeviceKind::Mouse), Some(5));
}

#[test]
fn listing_parse_empty_yields_none() {
    assert!(classifier::parse_device_listing("".as_bytes()).is_none());
    let junk = "N: Name=\"Power Button\"\nS: Sysfs=/devices/LNXSYSTM/input0\n";
    assert!(classifier::parse_device_listing(junk.as_bytes()).is_none());
}
