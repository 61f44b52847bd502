// Copyright 2025 rig Authors
// SPDX-License-Identifier: Apache-2.0

//! Runtime configuration
//!
//! Everything the backends need, resolved once at startup from the
//! command line and the device classifier.

use std::fs;
use std::path::{Path, PathBuf};

use rig_input::classifier::{self, DeviceKind, DeviceMapping};
use rig_input::InputKind;
use rig_screen::ScreenKind;

const DRI_DIR: &str = "/dev/dri";

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Which input backend to construct.
    pub input: InputKind,
    /// Which screen backend to construct.
    pub screen: ScreenKind,
    /// DRM card candidates, in probing order.
    pub cards: Vec<PathBuf>,
    /// Treat 32-bpp framebuffers as RGB instead of BGR.
    pub rgb: bool,
    /// Classified device mappings; absent when discovery found nothing.
    pub devices: Option<Vec<DeviceMapping>>,
}

impl RuntimeConfig {
    /// Build the config for the chosen backends, running the matching
    /// device classification mode.
    pub fn resolve(input: InputKind, screen: ScreenKind, card: Option<&str>, rgb: bool) -> Self {
        let devices = match input {
            InputKind::Uinput => Some(classifier::uinput_defaults()),
            InputKind::Evdev => classifier::discover_evdev(),
        };
        Self {
            input,
            screen,
            cards: discover_cards_in(Path::new(DRI_DIR), card),
            rgb,
            devices,
        }
    }

    /// Resolve a logical device kind to its event number, if the
    /// classifier produced a mapping for it.
    pub fn resolve_event(&self, kind: DeviceKind) -> Option<i32> {
        self.devices
            .as_deref()
            .and_then(|mappings| classifier::resolve_event(mappings, kind))
    }
}

/// Scan a directory for DRM card nodes (entries named `card*`). An
/// explicitly preferred card is probed first.
pub fn discover_cards_in(dir: &Path, preferred: Option<&str>) -> Vec<PathBuf> {
    let mut cards: Vec<PathBuf> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .filter(|entry| {
                    entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| name.starts_with("card"))
                })
                .map(|entry| entry.path())
                .collect()
        })
        .unwrap_or_default();
    cards.sort();

    if let Some(name) = preferred {
        let path = dir.join(name);
        cards.retain(|candidate| candidate != &path);
        cards.insert(0, path);
    }
    cards
}
