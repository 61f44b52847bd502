// Copyright 2025 rig Authors
// SPDX-License-Identifier: Apache-2.0

//! Input Injection Subsystem
//!
//! This crate provides the input half of the rig daemon: synthetic
//! pointer, touch and keyboard events are composed into gestures and
//! written into the kernel input layer through one of two backends:
//!
//! - **uinput**: a set of three virtual devices (mouse, keyboard,
//!   touchscreen) created once at startup and kept open for the process
//!   lifetime
//! - **evdev**: direct writes to an existing `/dev/input/eventN` node,
//!   opened per gesture
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Network Layer (external)                  │
//! └─────────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     InputBackend trait                      │
//! │     move / button / touch / swipe / key / text              │
//! └─────────────────────────────────────────────────────────────┘
//!          │                                    │
//!          ▼                                    ▼
//! ┌─────────────────┐                 ┌──────────────────┐
//! │ UinputBackend   │                 │ EvdevBackend     │
//! │ (virtual device │                 │ (open-per-       │
//! │  triple)        │                 │  gesture)        │
//! └─────────────────┘                 └──────────────────┘
//!          │                                    │
//!          └────────────┬───────────────────────┘
//!                       ▼
//!            gesture sequencer → event codec → kernel
//! ```

pub mod backend;
pub mod classifier;
pub mod codec;
pub mod event;
pub mod gesture;
pub mod uinput;

pub use backend::{EvdevBackend, InputBackend, InputHandle, InputKind, UinputBackend};
pub use classifier::{DeviceKind, DeviceMapping};
pub use event::RawInputEvent;
pub use uinput::VirtualDeviceSet;

/// Result type for input operations
pub type Result<T> = std::result::Result<T, InputError>;

/// Input error types
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("bad input: {0}")]
    BadInput(String),

    #[error("input device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("no such input event: {0}")]
    InvalidEvent(i32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
