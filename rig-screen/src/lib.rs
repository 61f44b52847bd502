// Copyright 2025 rig Authors
// SPDX-License-Identifier: Apache-2.0

//! Screen Capture Subsystem
//!
//! This crate provides the display half of the rig daemon: framebuffer
//! screenshots taken straight from the kernel graphics stack and handed
//! to the network layer as encoded image files.
//!
//! The KMS backend serves a screenshot two ways. The page-flip engine
//! owns the display with a pair of dumb buffers and keeps a warm,
//! latest-frame cache that makes repeated reads cheap; when the engine
//! has nothing yet (or failed to start), a one-shot snapshot maps the
//! currently scanned-out framebuffer instead. An optional ivi/Wayland
//! backend covers compositor-managed targets.

pub mod capture;
pub mod card;
pub mod flip;
#[cfg(feature = "ivi")]
pub mod ilm;
pub mod image;
pub mod kms;

pub use image::{ImageData, ImageKind};
pub use kms::{CrtcInfo, KmsScreen};

use serde::{Deserialize, Serialize};

/// Result type for screen operations
pub type Result<T> = std::result::Result<T, ScreenError>;

/// Screen error types
#[derive(Debug, thiserror::Error)]
pub enum ScreenError {
    #[error("bad input: {0}")]
    BadInput(String),

    #[error("screen device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("image encoding failed: {0}")]
    Encode(String),

    #[error("no frame available yet")]
    Unavailable,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Screen backend trait for screenshot retrieval.
pub trait ScreenBackend: Send + Sync {
    /// Short identifier used for logging and configuration.
    fn name(&self) -> &'static str;

    /// Human-readable screen listing, one screen per line.
    fn list_screens(&self) -> Result<String>;

    /// Grab the current frame of the given screen as an encoded image.
    fn grab_frame_buffer(&self, screen_id: u32) -> Result<ImageData>;
}

/// Available screen backend kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenKind {
    Kms,
    Ilm,
}

impl ScreenKind {
    pub fn name(&self) -> &'static str {
        match self {
            ScreenKind::Kms => "kms",
            ScreenKind::Ilm => "ilm",
        }
    }

    /// Parse a backend kind from a configuration string.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "kms" | "drm" => Some(ScreenKind::Kms),
            "ilm" | "ivi" => Some(ScreenKind::Ilm),
            _ => None,
        }
    }
}

/// The registry holds exactly one initialised variant.
pub enum ScreenHandle {
    Kms(KmsScreen),
    #[cfg(feature = "ivi")]
    Ilm(ilm::IlmScreen),
}

impl ScreenBackend for ScreenHandle {
    fn name(&self) -> &'static str {
        match self {
            ScreenHandle::Kms(screen) => screen.name(),
            #[cfg(feature = "ivi")]
            ScreenHandle::Ilm(screen) => screen.name(),
        }
    }

    fn list_screens(&self) -> Result<String> {
        match self {
            ScreenHandle::Kms(screen) => screen.list_screens(),
            #[cfg(feature = "ivi")]
            ScreenHandle::Ilm(screen) => screen.list_screens(),
        }
    }

    fn grab_frame_buffer(&self, screen_id: u32) -> Result<ImageData> {
        match self {
            ScreenHandle::Kms(screen) => screen.grab_frame_buffer(screen_id),
            #[cfg(feature = "ivi")]
            ScreenHandle::Ilm(screen) => screen.grab_frame_buffer(screen_id),
        }
    }
}
