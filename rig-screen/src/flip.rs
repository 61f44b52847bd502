// Copyright 2025 rig Authors
// SPDX-License-Identifier: Apache-2.0

//! Page-Flip Capture Engine
//!
//! Keeps screenshot reads cheap by owning the display: two dumb buffers
//! are bound to the chosen CRTC and page-flipped continuously, so a
//! read only has to encode the buffer that is *not* being scanned out.
//! DRM master is taken once to program the mode, then dropped; page
//! flips do not need it afterwards, which lets other DRM clients
//! coexist.
//!
//! One worker thread per process drives the engine. It blocks on the
//! card fd until the kernel signals flip completion, then swaps the
//! active buffer and resubmits; at most one flip is ever outstanding.
//! The 10-minute wait timeout stands in for a keep-alive timer: on
//! expiry the wait is simply re-armed.
//!
//! If any part of the flip setup fails (no dumb-buffer capability, no
//! usable connector binding, mode programming, the initial flip), a
//! simpler worker takes over: it re-captures a snapshot at a fixed
//! cadence into a two-slot ping-pong cache.
//!
//! ```text
//!  CREATED ──init ok──▶ WAITING_FLIP ──fd readable──▶ PROCESSING ─ok─▶ WAITING_FLIP
//!     │                                                  │
//!     │                                                  └─resubmit fail─▶ CLOSED
//!     └──── init fail ───▶ FALLBACK ──ticker──▶ capture ──▶ FALLBACK
//! ```

use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use drm::buffer::{Buffer, DrmFourcc};
use drm::control::dumbbuffer::DumbBuffer;
use drm::control::{
    connector, crtc, framebuffer, Device as ControlDevice, Event, Mode, PageFlipFlags,
};
use drm::Device;
use log::{debug, error, info, warn};

use crate::capture;
use crate::card::Card;
use crate::image::png;
use crate::kms;
use crate::{ImageData, Result, ScreenError};

/// Keep-alive wait on the card fd; expiry re-arms the wait.
const FLIP_WAIT_TIMEOUT_MS: i32 = 600_000;
/// Re-capture cadence of the time-based fallback worker.
const FALLBACK_CADENCE: Duration = Duration::from_millis(500);

/// A resolved scanout target: the first mode of a connected connector
/// and a CRTC able to drive it.
struct ConnectorBinding {
    crtc: crtc::Handle,
    connector: connector::Handle,
    mode: Mode,
}

/// Live flip state. The two buffers alternate between scanout and
/// screenshot duty; `active` is the index currently on screen.
struct FlipState {
    card: Card,
    crtc: crtc::Handle,
    connector: connector::Handle,
    mode: Mode,
    fbs: [framebuffer::Handle; 2],
    buffers: [Option<DumbBuffer>; 2],
    active: usize,
    pending: bool,
    rgb: bool,
}

impl FlipState {
    /// PNG of the buffer not currently scanned out. The mapping lives
    /// only for the duration of the encode.
    fn passive_frame(&mut self) -> Option<ImageData> {
        let idx = 1 - self.active;
        let rgb = self.rgb;
        let card = &self.card;
        let db = self.buffers[idx].as_mut()?;
        let (width, height) = db.size();
        let pitch = db.pitch();
        let mut mapping = match card.map_dumb_buffer(db) {
            Ok(mapping) => mapping,
            Err(e) => {
                warn!("cannot map passive buffer: {e}");
                return None;
            }
        };
        match png::encode(mapping.as_mut(), width, height, pitch, 32, rgb) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("passive buffer encode failed: {e}");
                None
            }
        }
    }
}

impl Drop for FlipState {
    fn drop(&mut self) {
        for i in 0..2 {
            if let Some(db) = self.buffers[i].take() {
                let _ = self.card.destroy_framebuffer(self.fbs[i]);
                let _ = self.card.destroy_dumb_buffer(db);
            }
        }
    }
}

/// Latched results of the time-based fallback worker.
#[derive(Default)]
struct FallbackCache {
    slots: [Option<ImageData>; 2],
    latest: Option<usize>,
}

impl FallbackCache {
    fn latest(&self) -> Option<ImageData> {
        self.latest.and_then(|i| self.slots[i].clone())
    }
}

enum EngineState {
    Starting,
    Flipping(FlipState),
    Fallback(FallbackCache),
    Closed,
}

/// Handle to the process-wide capture engine.
pub struct FlipEngine {
    shared: Arc<Mutex<EngineState>>,
}

impl FlipEngine {
    /// Start the engine on a detached worker thread. The handle is
    /// usable immediately; `image` returns `None` until a frame cache
    /// is warm.
    pub fn spawn(card: PathBuf, rgb: bool) -> Self {
        let shared = Arc::new(Mutex::new(EngineState::Starting));
        let worker_shared = Arc::clone(&shared);
        let spawned = thread::Builder::new()
            .name("rig-page-flip".into())
            .spawn(move || worker(worker_shared, card, rgb));
        if let Err(e) = spawned {
            error!("cannot start page-flip worker: {e}");
        }
        Self { shared }
    }

    /// Latest cached frame, if the engine has one.
    pub fn image(&self) -> Option<ImageData> {
        let mut guard = self.shared.lock().ok()?;
        match &mut *guard {
            EngineState::Flipping(state) => state.passive_frame(),
            EngineState::Fallback(cache) => cache.latest(),
            _ => None,
        }
    }
}

fn worker(shared: Arc<Mutex<EngineState>>, card_path: PathBuf, rgb: bool) {
    match initialise(&card_path, rgb) {
        Ok(state) => {
            let fd = state.card.file().as_raw_fd();
            let (width, height) = (state.mode.size().0, state.mode.size().1);
            info!(
                "page-flip engine running on {} at {width}x{height}",
                card_path.display()
            );
            {
                let Ok(mut guard) = shared.lock() else { return };
                *guard = EngineState::Flipping(state);
            }
            run_flip_loop(&shared, fd);
        }
        Err(e) => {
            warn!("page-flip setup failed ({e}); falling back to timed capture");
            run_fallback(&shared, card_path, rgb);
        }
    }
}

/// Resolve a binding per the policy: the connector's current encoder if
/// its CRTC has a valid mode, otherwise the first valid CRTC any of the
/// connector's encoders can drive.
fn resolve_binding(card: &Card) -> Result<ConnectorBinding> {
    let resources = card.resource_handles().map_err(|e| {
        ScreenError::DeviceUnavailable(format!("error getting display config: {e}"))
    })?;

    for &conn_handle in resources.connectors() {
        let Ok(conn) = card.get_connector(conn_handle, false) else {
            continue;
        };
        if conn.state() != connector::State::Connected || conn.modes().is_empty() {
            continue;
        }
        let mode = conn.modes()[0];

        if let Some(enc_handle) = conn.current_encoder() {
            if let Ok(enc) = card.get_encoder(enc_handle) {
                if let Some(crtc_handle) = enc.crtc() {
                    if let Ok(info) = card.get_crtc(crtc_handle) {
                        if info.mode().is_some() {
                            return Ok(ConnectorBinding {
                                crtc: crtc_handle,
                                connector: conn_handle,
                                mode,
                            });
                        }
                    }
                }
            }
        }

        for &enc_handle in conn.encoders() {
            let Ok(enc) = card.get_encoder(enc_handle) else {
                continue;
            };
            for crtc_handle in resources.filter_crtcs(enc.possible_crtcs()) {
                if let Ok(info) = card.get_crtc(crtc_handle) {
                    if info.mode().is_some() {
                        return Ok(ConnectorBinding {
                            crtc: crtc_handle,
                            connector: conn_handle,
                            mode,
                        });
                    }
                }
            }
        }
    }

    Err(ScreenError::DeviceUnavailable(
        "no connected output with a usable CRTC".into(),
    ))
}

/// Allocate one scanout buffer and register it as a framebuffer.
fn create_scanout(card: &Card, width: u32, height: u32) -> Result<(framebuffer::Handle, DumbBuffer)> {
    let db = card
        .create_dumb_buffer((width, height), DrmFourcc::Xrgb8888, 32)
        .map_err(|e| {
            ScreenError::DeviceUnavailable(format!("unable to create a dumb buffer: {e}"))
        })?;
    match card.add_framebuffer(&db, 24, 32) {
        Ok(fb) => Ok((fb, db)),
        Err(e) => {
            let _ = card.destroy_dumb_buffer(db);
            Err(ScreenError::DeviceUnavailable(format!(
                "unable to add frame buffer: {e}"
            )))
        }
    }
}

fn initialise(card_path: &Path, rgb: bool) -> Result<FlipState> {
    let card = Card::open(card_path).map_err(|e| {
        ScreenError::DeviceUnavailable(format!("cannot open {}: {e}", card_path.display()))
    })?;

    let dumb_cap = card
        .get_driver_capability(drm::DriverCapability::DumbBuffer)
        .map_err(|e| {
            ScreenError::DeviceUnavailable(format!("dumb buffer capability query failed: {e}"))
        })?;
    if dumb_cap == 0 {
        return Err(ScreenError::DeviceUnavailable(
            "DRM device cannot create dumb buffers".into(),
        ));
    }

    let binding = resolve_binding(&card)?;
    let (width, height) = (binding.mode.size().0 as u32, binding.mode.size().1 as u32);

    let (fb0, db0) = create_scanout(&card, width, height)?;
    let (fb1, db1) = match create_scanout(&card, width, height) {
        Ok(pair) => pair,
        Err(e) => {
            let _ = card.destroy_framebuffer(fb0);
            let _ = card.destroy_dumb_buffer(db0);
            return Err(e);
        }
    };

    debug!(
        "flip buffers ready: crtc {}, connector {}, {}x{}",
        u32::from(binding.crtc),
        u32::from(binding.connector),
        width,
        height
    );

    // from here on FlipState::drop cleans up on any failure
    let mut state = FlipState {
        card,
        crtc: binding.crtc,
        connector: binding.connector,
        mode: binding.mode,
        fbs: [fb0, fb1],
        buffers: [Some(db0), Some(db1)],
        active: 0,
        pending: false,
        rgb,
    };

    // master is needed only to program the mode once
    state.card.acquire_master_lock().map_err(|e| {
        ScreenError::DeviceUnavailable(format!("unable to switch to master mode: {e}"))
    })?;
    let programmed = state.card.set_crtc(
        state.crtc,
        Some(state.fbs[0]),
        (0, 0),
        &[state.connector],
        Some(state.mode),
    );
    let dropped = state.card.release_master_lock();
    programmed.map_err(|e| {
        ScreenError::DeviceUnavailable(format!("unable to set CRTC mode on buffer: {e}"))
    })?;
    dropped.map_err(|e| {
        ScreenError::DeviceUnavailable(format!("unable to drop master mode: {e}"))
    })?;

    state
        .card
        .page_flip(state.crtc, state.fbs[0], PageFlipFlags::EVENT, None)
        .map_err(|e| ScreenError::DeviceUnavailable(format!("initial page flip failed: {e}")))?;
    state.pending = true;

    Ok(state)
}

fn run_flip_loop(shared: &Mutex<EngineState>, fd: RawFd) {
    loop {
        let mut pollfd = libc::pollfd {
            fd,
            events: libc::POLLIN,
            revents: 0,
        };
        let rc = unsafe { libc::poll(&mut pollfd, 1, FLIP_WAIT_TIMEOUT_MS) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            error!("page-flip wait failed: {err}");
            close_engine(shared);
            return;
        }
        if rc == 0 {
            // quiescent period; re-arm the wait
            continue;
        }

        let Ok(mut guard) = shared.lock() else { return };
        let mut failed = false;
        match &mut *guard {
            EngineState::Flipping(state) => match state.card.receive_events() {
                Ok(events) => {
                    for event in events {
                        if let Event::PageFlip(_) = event {
                            if !state.pending {
                                continue;
                            }
                            state.pending = false;
                            state.active ^= 1;
                            match state.card.page_flip(
                                state.crtc,
                                state.fbs[state.active],
                                PageFlipFlags::EVENT,
                                None,
                            ) {
                                Ok(()) => state.pending = true,
                                Err(e) => {
                                    error!("page flip resubmit failed: {e}");
                                    failed = true;
                                }
                            }
                        }
                    }
                }
                Err(e) => {
                    error!("DRM event read failed: {e}");
                    failed = true;
                }
            },
            _ => return,
        }
        if failed {
            // tears down buffers and closes the card via Drop
            *guard = EngineState::Closed;
            return;
        }
    }
}

fn close_engine(shared: &Mutex<EngineState>) {
    if let Ok(mut guard) = shared.lock() {
        *guard = EngineState::Closed;
    }
}

fn run_fallback(shared: &Mutex<EngineState>, card_path: PathBuf, rgb: bool) {
    let screen_id = kms::find_usable_screen(&card_path)
        .map(|screen| screen.id)
        .unwrap_or(kms::FALLBACK_CRTC_ID);
    {
        let Ok(mut guard) = shared.lock() else { return };
        *guard = EngineState::Fallback(FallbackCache::default());
    }

    loop {
        let shot = capture::snapshot(&card_path, screen_id, rgb);
        {
            let Ok(mut guard) = shared.lock() else { return };
            let EngineState::Fallback(cache) = &mut *guard else {
                return;
            };
            match shot {
                Ok(image) => {
                    let slot = cache.latest.map(|i| i ^ 1).unwrap_or(0);
                    cache.slots[slot] = Some(image);
                    cache.latest = Some(slot);
                }
                Err(e) => debug!("timed capture failed: {e}"),
            }
        }
        thread::sleep(FALLBACK_CADENCE);
    }
}
