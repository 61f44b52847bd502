// Copyright 2025 rig Authors
// SPDX-License-Identifier: Apache-2.0

//! Input Backend Abstraction
//!
//! Both backends expose the same gesture surface; they differ only in
//! where the records go. The uinput backend routes logical event
//! numbers onto its virtual device triple and keeps the descriptors
//! open for the process lifetime. The evdev backend opens the named
//! `/dev/input/eventN` node for each gesture and closes it on return,
//! error paths included.
//!
//! Writes to a shared descriptor rely on `write(2)` being atomic for
//! single 24-byte records on the uinput character device; concurrent
//! gestures against the same device may interleave at record
//! granularity, which the daemon accepts.

use std::fs::{File, OpenOptions};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::uinput::VirtualDeviceSet;
use crate::{codec, gesture, InputError, Result};

/// Input backend trait for unified gesture injection.
pub trait InputBackend: Send + Sync {
    /// Short identifier used for logging and configuration.
    fn name(&self) -> &'static str;

    /// Move the contact point to `(x, y)`.
    fn move_to(&self, x: i32, y: i32, event: i32) -> Result<()>;

    /// Press (`value == 1`) or release (`value == 0`) the touch button.
    fn button(&self, value: i32, event: i32) -> Result<()>;

    /// Touch down at `(x, y)`, hold `duration_s` seconds, release.
    fn touch(&self, x: i32, y: i32, duration_s: u64, event: i32) -> Result<()>;

    /// Swipe between two points in `steps` interpolated frames.
    fn swipe(&self, x1: i32, y1: i32, x2: i32, y2: i32, steps: i32, event: i32) -> Result<()>;

    /// Press and release a single key.
    fn key(&self, code: u16, event: i32) -> Result<()>;

    /// Type a scancode sequence with inter-keystroke delay.
    fn text(&self, codes: &[u16], event: i32) -> Result<()>;
}

/// Available input backend kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Uinput,
    Evdev,
}

impl InputKind {
    pub fn name(&self) -> &'static str {
        match self {
            InputKind::Uinput => "uinput",
            InputKind::Evdev => "evdev",
        }
    }

    /// Parse a backend kind from a configuration string.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "uinput" => Some(InputKind::Uinput),
            "evdev" | "ev-dev" => Some(InputKind::Evdev),
            _ => None,
        }
    }
}

/// Slot of the virtual device triple a logical event number selects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RouteSlot {
    Mouse,
    Keyboard,
    Touch,
}

pub(crate) fn route_slot(event: i32) -> Result<RouteSlot> {
    match event {
        0 => Ok(RouteSlot::Mouse),
        1 => Ok(RouteSlot::Keyboard),
        2 => Ok(RouteSlot::Touch),
        other => Err(InputError::InvalidEvent(other)),
    }
}

// ============================================================================
// Uinput Backend
// ============================================================================

/// Injects through the process-global virtual device triple.
pub struct UinputBackend {
    devices: VirtualDeviceSet,
}

impl UinputBackend {
    pub fn create() -> Result<Self> {
        Ok(Self {
            devices: VirtualDeviceSet::create()?,
        })
    }

    fn route(&self, event: i32) -> Result<&File> {
        Ok(match route_slot(event)? {
            RouteSlot::Mouse => &self.devices.mouse,
            RouteSlot::Keyboard => &self.devices.keyboard,
            RouteSlot::Touch => &self.devices.touch,
        })
    }
}

impl InputBackend for UinputBackend {
    fn name(&self) -> &'static str {
        "uinput"
    }

    fn move_to(&self, x: i32, y: i32, event: i32) -> Result<()> {
        let mut fd = self.route(event)?;
        codec::position_mt(&mut fd, x, y)?;
        codec::syn_report(&mut fd)
    }

    fn button(&self, value: i32, event: i32) -> Result<()> {
        let mut fd = self.route(event)?;
        let tracking = if value == 0 { -1 } else { 100 };
        codec::tracking(&mut fd, tracking)?;
        codec::touch_button(&mut fd, value)?;
        codec::syn_report(&mut fd)
    }

    fn touch(&self, x: i32, y: i32, duration_s: u64, event: i32) -> Result<()> {
        let mut fd = self.route(event)?;
        gesture::touch(&mut fd, x, y, duration_s)
    }

    fn swipe(&self, x1: i32, y1: i32, x2: i32, y2: i32, steps: i32, event: i32) -> Result<()> {
        let mut fd = self.route(event)?;
        gesture::swipe(&mut fd, x1, y1, x2, y2, steps)
    }

    fn key(&self, code: u16, event: i32) -> Result<()> {
        let mut fd = self.route(event)?;
        codec::key(&mut fd, code)?;
        codec::syn_report(&mut fd)
    }

    fn text(&self, codes: &[u16], event: i32) -> Result<()> {
        let mut fd = self.route(event)?;
        gesture::text(&mut fd, codes)
    }
}

// ============================================================================
// Evdev Backend
// ============================================================================

/// Injects into existing kernel devices, one open per gesture.
#[derive(Default)]
pub struct EvdevBackend;

impl EvdevBackend {
    pub fn new() -> Self {
        Self
    }

    fn open(&self, event: i32) -> Result<File> {
        let path = format!("/dev/input/event{event}");
        debug!("opening {path}");
        OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| InputError::DeviceUnavailable(format!("cannot open {path}: {e}")))
    }
}

impl InputBackend for EvdevBackend {
    fn name(&self) -> &'static str {
        "evdev"
    }

    fn move_to(&self, x: i32, y: i32, event: i32) -> Result<()> {
        let mut fd = self.open(event)?;
        codec::position_mt(&mut fd, x, y)?;
        codec::syn_report(&mut fd)
    }

    fn button(&self, value: i32, event: i32) -> Result<()> {
        let mut fd = self.open(event)?;
        let tracking = if value == 0 { -1 } else { 100 };
        codec::tracking(&mut fd, tracking)?;
        codec::touch_button(&mut fd, value)?;
        codec::syn_report(&mut fd)
    }

    fn touch(&self, x: i32, y: i32, duration_s: u64, event: i32) -> Result<()> {
        let mut fd = self.open(event)?;
        gesture::touch(&mut fd, x, y, duration_s)
    }

    fn swipe(&self, x1: i32, y1: i32, x2: i32, y2: i32, steps: i32, event: i32) -> Result<()> {
        let mut fd = self.open(event)?;
        gesture::swipe(&mut fd, x1, y1, x2, y2, steps)
    }

    fn key(&self, code: u16, event: i32) -> Result<()> {
        let mut fd = self.open(event)?;
        codec::key(&mut fd, code)?;
        codec::syn_report(&mut fd)
    }

    fn text(&self, codes: &[u16], event: i32) -> Result<()> {
        let mut fd = self.open(event)?;
        gesture::text(&mut fd, codes)
    }
}

// ============================================================================
// Tagged Backend Handle
// ============================================================================

/// The registry holds exactly one initialised variant.
pub enum InputHandle {
    Uinput(UinputBackend),
    Evdev(EvdevBackend),
}

impl InputHandle {
    fn inner(&self) -> &dyn InputBackend {
        match self {
            InputHandle::Uinput(backend) => backend,
            InputHandle::Evdev(backend) => backend,
        }
    }
}

impl InputBackend for InputHandle {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn move_to(&self, x: i32, y: i32, event: i32) -> Result<()> {
        self.inner().move_to(x, y, event)
    }

    fn button(&self, value: i32, event: i32) -> Result<()> {
        self.inner().button(value, event)
    }

    fn touch(&self, x: i32, y: i32, duration_s: u64, event: i32) -> Result<()> {
        self.inner().touch(x, y, duration_s, event)
    }

    fn swipe(&self, x1: i32, y1: i32, x2: i32, y2: i32, steps: i32, event: i32) -> Result<()> {
        self.inner().swipe(x1, y1, x2, y2, steps, event)
    }

    fn key(&self, code: u16, event: i32) -> Result<()> {
        self.inner().key(code, event)
    }

    fn text(&self, codes: &[u16], event: i32) -> Result<()> {
        self.inner().text(codes, event)
    }
}
