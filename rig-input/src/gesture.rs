// Copyright 2025 rig Authors
// SPDX-License-Identifier: Apache-2.0

//! Gesture Sequencer
//!
//! Composes codec writes into the multi-record sequences the kernel
//! recognises as touches, swipes and typed text. Sequencing is
//! synchronous: `touch` blocks for its hold duration, `swipe` sleeps
//! between interpolated steps and `text` sleeps between keystrokes, all
//! on the calling thread.
//!
//! A failing write aborts the gesture where it stands; no attempt is
//! made to complete a footer over a broken descriptor.

use std::io::Write;
use std::thread;
use std::time::Duration;

use crate::codec;
use crate::{InputError, Result};

/// Tracking id assigned to the single synthetic contact.
const TRACKING_DOWN: i32 = 100;
/// Tracking id signalling contact end.
const TRACKING_UP: i32 = -1;
/// Contact pressure reported during a swipe.
const SWIPE_PRESSURE: i32 = 50;
/// Pause between interpolated swipe steps.
const SWIPE_STEP_DELAY: Duration = Duration::from_millis(500);
/// Pause after each keystroke while typing text.
const KEYSTROKE_DELAY: Duration = Duration::from_millis(1000);

/// Touch down at `(x, y)`, hold for `duration_s` seconds, release.
pub fn touch<W: Write>(out: &mut W, x: i32, y: i32, duration_s: u64) -> Result<()> {
    codec::tracking(out, TRACKING_DOWN)?;
    codec::position_mt(out, x, y)?;
    codec::touch_button(out, 1)?;
    codec::position_abs(out, x, y)?;
    codec::syn_report(out)?;

    if duration_s > 0 {
        thread::sleep(Duration::from_secs(duration_s));
    }

    codec::tracking(out, TRACKING_UP)?;
    codec::touch_button(out, 0)?;
    codec::syn_report(out)
}

/// Swipe from `(x1, y1)` to `(x2, y2)` in `steps` interpolated frames.
///
/// `steps` is a frame count, not a physical velocity; zero is rejected
/// because the per-step increment divides by it.
pub fn swipe<W: Write>(out: &mut W, x1: i32, y1: i32, x2: i32, y2: i32, steps: i32) -> Result<()> {
    if steps < 1 {
        return Err(InputError::BadInput(format!(
            "swipe step count must be positive, got {steps}"
        )));
    }

    let step_x = -(x1 - x2) / steps;
    let step_y = -(y1 - y2) / steps;
    let mut x = x1;
    let mut y = y1;
    let mut major = 2;

    codec::major(out, major)?;
    codec::pressure(out, SWIPE_PRESSURE)?;
    codec::position_mt(out, x, y)?;
    codec::tracking(out, TRACKING_DOWN)?;
    codec::touch_button(out, 1)?;
    codec::syn_report(out)?;

    for _ in 0..steps {
        codec::major(out, major)?;
        major += 1;
        codec::pressure(out, SWIPE_PRESSURE)?;
        codec::tracking(out, TRACKING_DOWN)?;
        codec::position_mt(out, x, y)?;
        codec::syn_report(out)?;
        thread::sleep(SWIPE_STEP_DELAY);
        x += step_x;
        y += step_y;
    }

    // land exactly on the destination, whatever the integer rounding did
    codec::major(out, major)?;
    codec::pressure(out, SWIPE_PRESSURE)?;
    codec::position_mt(out, x2, y2)?;
    codec::syn_report(out)?;

    codec::major(out, 0)?;
    codec::pressure(out, 0)?;
    codec::tracking(out, TRACKING_UP)?;
    codec::touch_button(out, 0)?;
    codec::syn_report(out)
}

/// Type a sequence of scancodes, pausing after each keystroke. The
/// first failing write halts the remainder.
pub fn text<W: Write>(out: &mut W, codes: &[u16]) -> Result<()> {
    for &code in codes {
        codec::key(out, code)?;
        codec::syn_report(out)?;
        thread::sleep(KEYSTROKE_DELAY);
    }
    Ok(())
}
