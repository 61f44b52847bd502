// Copyright 2025 rig Authors
// SPDX-License-Identifier: Apache-2.0

//! Event Codec
//!
//! Writes single input records, in submission order, to any byte sink.
//! Production call sites pass the device file descriptor; tests pass an
//! in-memory buffer. The first failing write aborts the current gesture.
//!
//! Positions are passed through verbatim as 32-bit signed integers;
//! bounds clipping is the kernel's responsibility.

use std::io::Write;

use crate::event::{abs, btn, ev, rel, syn, RawInputEvent};
use crate::Result;

/// Write one record. Every other helper in this module funnels through
/// here so ordering is exactly the call order.
pub fn write_event<W: Write>(out: &mut W, kind: u16, code: u16, value: i32) -> Result<()> {
    let record = RawInputEvent::new(kind, code, value);
    out.write_all(record.as_bytes())?;
    Ok(())
}

/// `SYN_REPORT`: commits everything written since the previous report.
pub fn syn_report<W: Write>(out: &mut W) -> Result<()> {
    write_event(out, ev::SYN, syn::REPORT, 0)
}

/// `BTN_TOUCH` transition; `value` is 1 for contact, 0 for release.
pub fn touch_button<W: Write>(out: &mut W, value: i32) -> Result<()> {
    write_event(out, ev::KEY, btn::TOUCH, value)
}

/// Press and release a key. The caller is responsible for the
/// following `SYN_REPORT`.
pub fn key<W: Write>(out: &mut W, code: u16) -> Result<()> {
    write_event(out, ev::KEY, code, 1)?;
    write_event(out, ev::KEY, code, 0)
}

/// Absolute single-touch position: `ABS_X` then `ABS_Y`.
pub fn position_abs<W: Write>(out: &mut W, x: i32, y: i32) -> Result<()> {
    write_event(out, ev::ABS, abs::X, x)?;
    write_event(out, ev::ABS, abs::Y, y)
}

/// Multi-touch position: `ABS_MT_POSITION_X` then `ABS_MT_POSITION_Y`.
pub fn position_mt<W: Write>(out: &mut W, x: i32, y: i32) -> Result<()> {
    write_event(out, ev::ABS, abs::MT_POSITION_X, x)?;
    write_event(out, ev::ABS, abs::MT_POSITION_Y, y)
}

/// Relative pointer motion: `REL_X` then `REL_Y`.
pub fn position_rel<W: Write>(out: &mut W, x: i32, y: i32) -> Result<()> {
    write_event(out, ev::REL, rel::X, x)?;
    write_event(out, ev::REL, rel::Y, y)
}

/// `ABS_MT_TRACKING_ID`; 100 marks contact start, -1 marks contact end.
pub fn tracking<W: Write>(out: &mut W, value: i32) -> Result<()> {
    write_event(out, ev::ABS, abs::MT_TRACKING_ID, value)
}

pub fn pressure<W: Write>(out: &mut W, value: i32) -> Result<()> {
    write_event(out, ev::ABS, abs::MT_PRESSURE, value)
}

/// Touch ellipse size: `ABS_MT_TOUCH_MAJOR` and `ABS_MT_WIDTH_MAJOR`
/// with the same value.
pub fn major<W: Write>(out: &mut W, value: i32) -> Result<()> {
    write_event(out, ev::ABS, abs::MT_TOUCH_MAJOR, value)?;
    write_event(out, ev::ABS, abs::MT_WIDTH_MAJOR, value)
}
