// Copyright 2025 rig Authors
// SPDX-License-Identifier: Apache-2.0

//! PNG encoding of raw framebuffer rows
//!
//! Framebuffers arrive as 32-bpp XRGB/XBGR (or packed 24-bpp) rows with
//! an arbitrary pitch. Output is always 8-bit RGB, no interlace, at the
//! fastest compression setting: screenshots are transient and latency
//! beats ratio here.

use std::io::Write;

use crate::{ImageData, ImageKind, Result, ScreenError};

/// Encode `height` rows of `pitch` bytes starting at `src[0]`.
///
/// When `rgb` is false a 32-bpp source is treated as BGR with the
/// filler byte last, which is what KMS dumb buffers scan out.
pub fn encode(src: &[u8], width: u32, height: u32, pitch: u32, bpp: u32, rgb: bool) -> Result<ImageData> {
    let bytes_per_pixel = match bpp {
        32 => 4usize,
        24 => 3usize,
        other => {
            return Err(ScreenError::Encode(format!(
                "unsupported source depth: {other} bpp"
            )))
        }
    };

    let pitch = pitch as usize;
    let width_px = width as usize;
    let rows = height as usize;
    if pitch < width_px * bytes_per_pixel || src.len() < pitch * rows {
        return Err(ScreenError::Encode(format!(
            "source buffer too small: {} bytes for {width}x{height} pitch {pitch}",
            src.len()
        )));
    }

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Fast);
        let mut writer = encoder
            .write_header()
            .map_err(|e| ScreenError::Encode(e.to_string()))?;
        let mut stream = writer
            .stream_writer()
            .map_err(|e| ScreenError::Encode(e.to_string()))?;

        let mut row = vec![0u8; width_px * 3];
        for j in 0..rows {
            let line = &src[j * pitch..j * pitch + width_px * bytes_per_pixel];
            for (x, pixel) in line.chunks_exact(bytes_per_pixel).enumerate() {
                let (r, g, b) = if rgb || bytes_per_pixel == 3 {
                    (pixel[0], pixel[1], pixel[2])
                } else {
                    (pixel[2], pixel[1], pixel[0])
                };
                row[x * 3] = r;
                row[x * 3 + 1] = g;
                row[x * 3 + 2] = b;
            }
            stream
                .write_all(&row)
                .map_err(|e| ScreenError::Encode(format!("unable to append row: {e}")))?;
        }
        stream
            .finish()
            .map_err(|e| ScreenError::Encode(format!("unable to write image end: {e}")))?;
    }

    Ok(ImageData {
        bytes: out,
        kind: ImageKind::Png,
    })
}
