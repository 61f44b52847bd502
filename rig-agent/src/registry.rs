// Copyright 2025 rig Authors
// SPDX-License-Identifier: Apache-2.0

//! Backend Registry
//!
//! Process-wide singletons: exactly one input backend and one screen
//! backend, constructed lazily on first use and never torn down. The
//! `OnceLock` guards resolve concurrent first calls to a single
//! construction; after that the handles are immutable shared state.

use std::sync::OnceLock;

use log::error;
use rig_input::classifier::DeviceKind;
use rig_input::{EvdevBackend, InputError, InputHandle, InputKind, UinputBackend};
use rig_screen::{KmsScreen, ScreenError, ScreenHandle, ScreenKind};

use crate::config::RuntimeConfig;

static CONFIG: OnceLock<RuntimeConfig> = OnceLock::new();
static INPUT: OnceLock<Option<InputHandle>> = OnceLock::new();
static SCREEN: OnceLock<Option<ScreenHandle>> = OnceLock::new();

/// Install the runtime configuration. Returns false if the registry
/// was already configured; the first configuration wins.
pub fn configure(config: RuntimeConfig) -> bool {
    CONFIG.set(config).is_ok()
}

fn config() -> Option<&'static RuntimeConfig> {
    CONFIG.get()
}

/// The process input backend, creating it on first call.
pub fn input() -> Result<&'static InputHandle, InputError> {
    let cfg = config().ok_or_else(|| {
        InputError::DeviceUnavailable("registry is not configured".into())
    })?;
    INPUT
        .get_or_init(|| match cfg.input {
            InputKind::Uinput => match UinputBackend::create() {
                Ok(backend) => Some(InputHandle::Uinput(backend)),
                Err(e) => {
                    error!("uinput backend creation failed: {e}");
                    None
                }
            },
            InputKind::Evdev => Some(InputHandle::Evdev(EvdevBackend::new())),
        })
        .as_ref()
        .ok_or_else(|| {
            InputError::DeviceUnavailable("input backend failed to initialise".into())
        })
}

/// The process screen backend, creating it on first call. For KMS this
/// also starts the page-flip capture engine on its detached worker.
pub fn screen() -> Result<&'static ScreenHandle, ScreenError> {
    let cfg = config().ok_or_else(|| {
        ScreenError::DeviceUnavailable("registry is not configured".into())
    })?;
    SCREEN
        .get_or_init(|| match cfg.screen {
            ScreenKind::Kms => match KmsScreen::create(&cfg.cards, cfg.rgb) {
                Ok(backend) => Some(ScreenHandle::Kms(backend)),
                Err(e) => {
                    error!("kms backend creation failed: {e}");
                    None
                }
            },
            #[cfg(feature = "ivi")]
            ScreenKind::Ilm => match rig_screen::ilm::IlmScreen::create() {
                Ok(backend) => Some(ScreenHandle::Ilm(backend)),
                Err(e) => {
                    error!("ivi backend creation failed: {e}");
                    None
                }
            },
            #[cfg(not(feature = "ivi"))]
            ScreenKind::Ilm => {
                error!("this build carries no ivi support");
                None
            }
        })
        .as_ref()
        .ok_or_else(|| {
            ScreenError::DeviceUnavailable("screen backend failed to initialise".into())
        })
}

/// Resolve a logical device kind to an event number via the startup
/// classification. Absent when nothing classified.
pub fn resolve_event(kind: DeviceKind) -> Option<i32> {
    config().and_then(|cfg| cfg.resolve_event(kind))
}
