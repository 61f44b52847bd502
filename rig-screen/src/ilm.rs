// Copyright 2025 rig Authors
// SPDX-License-Identifier: Apache-2.0

//! ivi Screen Backend (feature `ivi`)
//!
//! For targets where a GENIVI-style compositor owns the display instead
//! of giving us KMS. Connecting requires the compositor to advertise
//! the `ivi_wm` window-manager interface; output geometry comes from
//! the core `wl_output` globals.
//!
//! The ivi screenshot request itself is a private compositor protocol
//! with no generated Rust bindings; grabs report `Unavailable` and the
//! operator is pointed at the KMS backend, which captures regardless of
//! the compositor.

use wayland_client::protocol::{wl_output, wl_registry};
use wayland_client::{Connection, Dispatch, QueueHandle, WEnum};

use log::{info, warn};

use crate::{ImageData, Result, ScreenBackend, ScreenError};

const IVI_WM_INTERFACE: &str = "ivi_wm";

#[derive(Clone, Copy, Debug, Default)]
struct OutputScreen {
    id: u32,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

#[derive(Default)]
struct Globals {
    outputs: Vec<OutputScreen>,
    has_wm: bool,
}

impl Dispatch<wl_registry::WlRegistry, ()> for Globals {
    fn event(
        state: &mut Self,
        registry: &wl_registry::WlRegistry,
        event: wl_registry::Event,
        _: &(),
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        if let wl_registry::Event::Global {
            name, interface, ..
        } = event
        {
            match interface.as_str() {
                "wl_output" => {
                    registry.bind::<wl_output::WlOutput, _, _>(name, 1, qh, name);
                    state.outputs.push(OutputScreen {
                        id: name,
                        ..Default::default()
                    });
                }
                IVI_WM_INTERFACE => state.has_wm = true,
                _ => {}
            }
        }
    }
}

impl Dispatch<wl_output::WlOutput, u32> for Globals {
    fn event(
        state: &mut Self,
        _output: &wl_output::WlOutput,
        event: wl_output::Event,
        data: &u32,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        let Some(screen) = state.outputs.iter_mut().find(|o| o.id == *data) else {
            return;
        };
        match event {
            wl_output::Event::Geometry { x, y, .. } => {
                screen.x = x;
                screen.y = y;
            }
            wl_output::Event::Mode {
                flags: WEnum::Value(flags),
                width,
                height,
                ..
            } if flags.contains(wl_output::Mode::Current) => {
                screen.width = width;
                screen.height = height;
            }
            _ => {}
        }
    }
}

/// Screen backend for ivi-compositor targets.
pub struct IlmScreen {
    outputs: Vec<OutputScreen>,
}

impl IlmScreen {
    /// Connect to the Wayland display and enumerate its outputs. Fails
    /// when there is no display or the compositor does not expose
    /// `ivi_wm`.
    pub fn create() -> Result<Self> {
        let conn = Connection::connect_to_env().map_err(|e| {
            ScreenError::DeviceUnavailable(format!("failed to connect to the Wayland display: {e}"))
        })?;
        let mut queue = conn.new_event_queue();
        let qh = queue.handle();
        let display = conn.display();
        let _registry = display.get_registry(&qh, ());

        let mut globals = Globals::default();
        // first pass collects globals, second the bound output events
        for _ in 0..2 {
            queue.roundtrip(&mut globals).map_err(|e| {
                ScreenError::DeviceUnavailable(format!("failed to get globals: {e}"))
            })?;
        }

        if !globals.has_wm {
            return Err(ScreenError::DeviceUnavailable(
                "compositor does not expose the ivi_wm interface".into(),
            ));
        }
        info!("ivi backend connected, {} output(s)", globals.outputs.len());
        Ok(Self {
            outputs: globals.outputs,
        })
    }
}

impl ScreenBackend for IlmScreen {
    fn name(&self) -> &'static str {
        "ilm"
    }

    fn list_screens(&self) -> Result<String> {
        Ok(self
            .outputs
            .iter()
            .map(|screen| {
                format!(
                    "Screen: ID={}, geometry={}x{}+{}+{}\n",
                    screen.id, screen.width, screen.height, screen.x, screen.y
                )
            })
            .collect())
    }

    fn grab_frame_buffer(&self, screen_id: u32) -> Result<ImageData> {
        if !self.outputs.iter().any(|screen| screen.id == screen_id) {
            return Err(ScreenError::BadInput(format!(
                "no screen with id {screen_id}"
            )));
        }
        warn!("ivi screenshot protocol is not negotiated; use the kms backend for captures");
        Err(ScreenError::Unavailable)
    }
}
