// Copyright 2025 rig Authors
// SPDX-License-Identifier: Apache-2.0

//! KMS Screen Backend
//!
//! Enumerates CRTCs on a DRM card, picks a usable card at startup by
//! trial capture, and serves screenshots: the page-flip engine's cached
//! frame when it is warm, a one-shot snapshot otherwise.

use std::path::{Path, PathBuf};

use drm::control::Device as ControlDevice;
use log::{debug, info, warn};

use crate::capture;
use crate::card::Card;
use crate::flip::FlipEngine;
use crate::{ImageData, Result, ScreenBackend, ScreenError};

/// CRTC id probed when a card reports no CRTC with a valid mode.
pub(crate) const FALLBACK_CRTC_ID: u32 = 2;

/// One display controller as the network layer sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CrtcInfo {
    pub id: u32,
    pub mode_valid: bool,
}

/// Enumerate the CRTCs of a card, preserving kernel order. The card is
/// opened read-only and closed before returning.
pub fn list_crtcs(card_path: &Path) -> Result<Vec<CrtcInfo>> {
    let card = Card::open_readonly(card_path).map_err(|e| {
        ScreenError::DeviceUnavailable(format!("cannot open {}: {e}", card_path.display()))
    })?;
    let resources = card.resource_handles().map_err(|e| {
        ScreenError::DeviceUnavailable(format!(
            "error getting display config for {}: {e}",
            card_path.display()
        ))
    })?;

    let mut screens = Vec::with_capacity(resources.crtcs().len());
    for &handle in resources.crtcs() {
        match card.get_crtc(handle) {
            Ok(info) => screens.push(CrtcInfo {
                id: u32::from(handle),
                mode_valid: info.mode().is_some(),
            }),
            Err(e) => warn!("error getting CRTC {}: {e}", u32::from(handle)),
        }
    }
    Ok(screens)
}

/// One `CRTC: ID=<id>, mode_valid=<0|1>` line per controller.
pub fn format_crtc_lines(screens: &[CrtcInfo]) -> String {
    screens
        .iter()
        .map(|screen| format!("CRTC: ID={}, mode_valid={}\n", screen.id, screen.mode_valid as u8))
        .collect()
}

/// First CRTC with a valid mode, if any.
pub fn find_usable_screen(card_path: &Path) -> Option<CrtcInfo> {
    list_crtcs(card_path)
        .ok()?
        .into_iter()
        .find(|screen| screen.mode_valid)
}

/// Probe each candidate card with a full capture; the first one that
/// yields an image wins.
pub fn select_suitable_card(candidates: &[PathBuf], rgb: bool) -> Option<PathBuf> {
    for candidate in candidates {
        let screen_id = find_usable_screen(candidate)
            .map(|screen| screen.id)
            .unwrap_or(FALLBACK_CRTC_ID);
        match capture::snapshot(candidate, screen_id, rgb) {
            Ok(image) if !image.is_empty() => {
                info!("selected DRM card {}", candidate.display());
                return Some(candidate.clone());
            }
            Ok(_) => {}
            Err(e) => debug!("card {} not usable: {e}", candidate.display()),
        }
    }
    None
}

/// The KMS screen backend. Construction resolves a card and starts the
/// page-flip engine on its own detached worker.
pub struct KmsScreen {
    card: PathBuf,
    rgb: bool,
    engine: FlipEngine,
}

impl KmsScreen {
    pub fn create(candidates: &[PathBuf], rgb: bool) -> Result<Self> {
        let card = select_suitable_card(candidates, rgb).ok_or_else(|| {
            ScreenError::DeviceUnavailable("no DRM card yields a capturable screen".into())
        })?;
        let engine = FlipEngine::spawn(card.clone(), rgb);
        Ok(Self { card, rgb, engine })
    }

    pub fn card(&self) -> &Path {
        &self.card
    }
}

impl ScreenBackend for KmsScreen {
    fn name(&self) -> &'static str {
        "kms"
    }

    fn list_screens(&self) -> Result<String> {
        Ok(format_crtc_lines(&list_crtcs(&self.card)?))
    }

    fn grab_frame_buffer(&self, screen_id: u32) -> Result<ImageData> {
        if let Some(image) = self.engine.image() {
            return Ok(image);
        }
        capture::snapshot(&self.card, screen_id, self.rgb)
    }
}
