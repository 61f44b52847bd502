// Copyright 2025 rig Authors
// SPDX-License-Identifier: Apache-2.0

//! Snapshot Capture
//!
//! One-shot screenshot of whatever the given CRTC currently scans out:
//! open the card, look up the framebuffer, map its dumb-buffer handle
//! read-only, and feed the rows to the PNG encoder. Every resource is
//! released on every exit path; the card is not kept open between
//! captures.

use std::io;
use std::num::NonZeroU32;
use std::os::fd::AsRawFd;
use std::path::Path;

use drm::control::{crtc, Device as ControlDevice};
use libc::c_ulong;
use log::debug;
use memmap2::MmapOptions;

use crate::card::Card;
use crate::image::png;
use crate::{ImageData, Result, ScreenError};

// Ref: drm_mode.h, _IOWR('d', 0xb3, struct drm_mode_map_dumb)
const DRM_IOCTL_MODE_MAP_DUMB: c_ulong = 0xc010_64b3;

#[repr(C)]
#[allow(dead_code)]
struct DrmModeMapDumb {
    handle: u32,
    pad: u32,
    offset: u64,
}

pub(crate) fn crtc_handle(id: u32) -> Option<crtc::Handle> {
    NonZeroU32::new(id).map(crtc::Handle::from)
}

/// Resolve the mmap offset for a buffer handle on this card.
fn map_dumb_offset(card: &Card, handle: u32) -> Result<u64> {
    let mut arg = DrmModeMapDumb {
        handle,
        pad: 0,
        offset: 0,
    };
    let rc = unsafe {
        libc::ioctl(
            card.file().as_raw_fd(),
            DRM_IOCTL_MODE_MAP_DUMB,
            &mut arg as *mut DrmModeMapDumb,
        )
    };
    if rc < 0 {
        return Err(ScreenError::Io(io::Error::last_os_error()));
    }
    Ok(arg.offset)
}

/// Capture the framebuffer currently bound to `screen_id` as a PNG.
pub fn snapshot(card_path: &Path, screen_id: u32, rgb: bool) -> Result<ImageData> {
    let card = Card::open(card_path).map_err(|e| {
        ScreenError::DeviceUnavailable(format!("cannot open {}: {e}", card_path.display()))
    })?;

    let handle = crtc_handle(screen_id)
        .ok_or_else(|| ScreenError::BadInput(format!("invalid screen id {screen_id}")))?;
    let crtc_info = card
        .get_crtc(handle)
        .map_err(|e| ScreenError::BadInput(format!("error getting CRTC {screen_id}: {e}")))?;
    let fb_handle = crtc_info.framebuffer().ok_or_else(|| {
        ScreenError::DeviceUnavailable(format!("CRTC {screen_id} has no framebuffer bound"))
    })?;

    let fb = card.get_framebuffer(fb_handle)?;
    let (width, height) = fb.size();
    let pitch = fb.pitch();
    let bpp = fb.bpp();
    let buffer = fb.buffer().ok_or_else(|| {
        ScreenError::DeviceUnavailable("framebuffer exposes no mappable buffer handle".into())
    })?;

    let offset = map_dumb_offset(&card, u32::from(buffer))?;
    let len = pitch as usize * height as usize;
    // read-only shared mapping through the card fd; dropped on return
    let map = unsafe { MmapOptions::new().offset(offset).len(len).map(card.file())? };

    debug!("snapshot of CRTC {screen_id}: {width}x{height}, pitch {pitch}, {bpp} bpp");
    png::encode(&map, width, height, pitch, bpp, rgb)
}
