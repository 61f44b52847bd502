// Copyright 2025 rig Authors
// SPDX-License-Identifier: Apache-2.0

//! Device Classifier
//!
//! Maps logical device kinds onto numeric event ids so the network
//! layer can omit explicit event numbers. Two modes: fixed defaults for
//! the uinput triple, and discovery by parsing `/proc/bus/input/devices`
//! for the evdev backend.

use std::fs::File;
use std::io::{BufRead, BufReader};

use log::{info, warn};
use serde::{Deserialize, Serialize};

const PROC_INPUT_DEVICES: &str = "/proc/bus/input/devices";

/// Logical kind of an input device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Keyboard,
    Mouse,
    Trackpad,
    Touchscreen,
}

impl DeviceKind {
    pub fn name(&self) -> &'static str {
        match self {
            DeviceKind::Keyboard => "Keyboard",
            DeviceKind::Mouse => "Mouse",
            DeviceKind::Trackpad => "Trackpad",
            DeviceKind::Touchscreen => "Touch",
        }
    }
}

/// One classified device: its event node number, a 1-based rank among
/// devices of the same kind, and the kind itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceMapping {
    pub event_number: i32,
    pub relevance: i32,
    pub kind: DeviceKind,
}

/// Fixed mapping for the uinput virtual device triple.
pub fn uinput_defaults() -> Vec<DeviceMapping> {
    let mut mappings = vec![
        DeviceMapping {
            event_number: 0,
            relevance: 1,
            kind: DeviceKind::Mouse,
        },
        DeviceMapping {
            event_number: 1,
            relevance: 1,
            kind: DeviceKind::Keyboard,
        },
        DeviceMapping {
            event_number: 2,
            relevance: 1,
            kind: DeviceKind::Touchscreen,
        },
    ];
    sort_mappings(&mut mappings);
    mappings
}

/// Scan the kernel's device listing. Returns `None` when nothing
/// classifiable was found, in which case requests must carry explicit
/// event numbers.
pub fn discover_evdev() -> Option<Vec<DeviceMapping>> {
    let file = match File::open(PROC_INPUT_DEVICES) {
        Ok(file) => file,
        Err(e) => {
            warn!("cannot read {PROC_INPUT_DEVICES}: {e}");
            return None;
        }
    };
    parse_device_listing(BufReader::new(file))
}

/// Parse a `/proc/bus/input/devices`-formatted listing.
///
/// Tracks the `N: Name="..."` and `S: Sysfs=...` fields per block; once
/// both are present, the trailing `inputNN` component of the sysfs path
/// yields the event number and the name substring yields the kind.
pub fn parse_device_listing<R: BufRead>(reader: R) -> Option<Vec<DeviceMapping>> {
    let mut name = String::new();
    let mut sysfs = String::new();
    let mut mappings = Vec::new();
    let mut relevance = [0i32; 4];

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("N:") {
            if let Some(value) = field_value(line, "Name") {
                name = value;
            }
        } else if line.starts_with("S:") {
            if let Some(value) = field_value(line, "Sysfs") {
                sysfs = value;
            }
        }

        if !name.is_empty() && !sysfs.is_empty() {
            if let Some(event_number) = event_number_from_sysfs(&sysfs) {
                if let Some(kind) = classify_name(&name) {
                    let slot = kind as usize;
                    relevance[slot] += 1;
                    mappings.push(DeviceMapping {
                        event_number,
                        relevance: relevance[slot],
                        kind,
                    });
                }
            }
            name.clear();
            sysfs.clear();
        }
    }

    if mappings.is_empty() {
        return None;
    }
    sort_mappings(&mut mappings);
    Some(mappings)
}

/// Classify a device by name substring, case-insensitively. Names that
/// match nothing are discarded.
pub fn classify_name(name: &str) -> Option<DeviceKind> {
    let name = name.to_lowercase();
    if name.contains("keyboard") {
        Some(DeviceKind::Keyboard)
    } else if name.contains("mouse") {
        Some(DeviceKind::Mouse)
    } else if name.contains("touchpad") {
        Some(DeviceKind::Trackpad)
    } else if name.contains("touchinput") {
        Some(DeviceKind::Touchscreen)
    } else {
        None
    }
}

/// First mapping of the requested kind in sort order, if any.
pub fn resolve_event(mappings: &[DeviceMapping], kind: DeviceKind) -> Option<i32> {
    mappings
        .iter()
        .find(|mapping| mapping.kind == kind)
        .map(|mapping| mapping.event_number)
}

/// Log one line per mapping, the way operators see what resolved where.
pub fn show_mappings(mappings: &[DeviceMapping]) {
    for mapping in mappings {
        info!(
            "'{}' event on id '{}'",
            mapping.kind.name(),
            mapping.event_number
        );
    }
}

fn sort_mappings(mappings: &mut [DeviceMapping]) {
    mappings.sort_by_key(|mapping| (mapping.event_number, mapping.relevance));
}

/// Extract the value of a `X: Key=value` line, stripping surrounding
/// quotes from the value.
fn field_value(line: &str, expected_key: &str) -> Option<String> {
    let rest = line.get(3..)?;
    let (key, value) = rest.split_once('=')?;
    if key.trim() != expected_key {
        return None;
    }
    Some(value.trim().trim_matches('"').trim().to_string())
}

/// The event number hides in the trailing `inputNN` path component.
fn event_number_from_sysfs(sysfs: &str) -> Option<i32> {
    let component = sysfs.rsplit('/').find(|c| !c.is_empty())?;
    let suffix = component.strip_prefix("input")?;
    suffix.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_value_strips_quotes() {
        assert_eq!(
            field_value(r#"N: Name="AT Translated Keyboard""#, "Name"),
            Some("AT Translated Keyboard".to_string())
        );
        assert_eq!(
            field_value("S: Sysfs=/devices/platform/input3", "Sysfs"),
            Some("/devices/platform/input3".to_string())
        );
        assert_eq!(field_value("N: Name=\"x\"", "Sysfs"), None);
    }

    #[test]
    fn sysfs_event_numbers() {
        assert_eq!(event_number_from_sysfs("/devices/virtual/input/input7"), Some(7));
        assert_eq!(event_number_from_sysfs("/devices/input/input12/"), Some(12));
        assert_eq!(event_number_from_sysfs("/devices/pci/usb3"), None);
        assert_eq!(event_number_from_sysfs("/devices/input/inputX"), None);
    }

    #[test]
    fn name_classification() {
        assert_eq!(classify_name("AT Translated Set 2 Keyboard"), Some(DeviceKind::Keyboard));
        assert_eq!(classify_name("Logitech USB Mouse"), Some(DeviceKind::Mouse));
        assert_eq!(classify_name("Synaptics TouchPad"), Some(DeviceKind::Trackpad));
        assert_eq!(classify_name("rig touchinput device"), Some(DeviceKind::Touchscreen));
        assert_eq!(classify_name("VirtualBox USB Tablet"), None);
    }

    #[test]
    fn keyboard_wins_over_later_substrings() {
        // fixed match order: keyboard before mouse
        assert_eq!(classify_name("keyboard mouse combo"), Some(DeviceKind::Keyboard));
    }
}
