// Copyright 2025 rig Authors
// SPDX-License-Identifier: Apache-2.0

//! BMP container emission
//!
//! A fixed 54-byte little-endian header followed by the raw pixel
//! bytes, unchanged. The caller is responsible for the payload already
//! matching BMP expectations (BGR[A], bottom-up rows).

use crate::{ImageData, ImageKind, Result, ScreenError};

/// File header (14) plus BITMAPINFOHEADER (40).
pub const HEADER_SIZE: usize = 54;

/// Wrap `stride * height` raw bytes in a 32-bpp uncompressed BMP file.
pub fn encode(raw: &[u8], width: i32, height: i32, stride: u32) -> Result<ImageData> {
    let image_size = stride as usize * height.unsigned_abs() as usize;
    if raw.len() < image_size {
        return Err(ScreenError::Encode(format!(
            "raw buffer holds {} bytes, header claims {image_size}",
            raw.len()
        )));
    }

    let mut bytes = Vec::with_capacity(HEADER_SIZE + image_size);
    bytes.extend_from_slice(&0x4D42u16.to_le_bytes()); // "BM"
    bytes.extend_from_slice(&((HEADER_SIZE + image_size) as u32).to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes()); // reserved1
    bytes.extend_from_slice(&0u16.to_le_bytes()); // reserved2
    bytes.extend_from_slice(&(HEADER_SIZE as u32).to_le_bytes()); // pixel data offset
    bytes.extend_from_slice(&40u32.to_le_bytes()); // info header size
    bytes.extend_from_slice(&width.to_le_bytes());
    bytes.extend_from_slice(&height.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // planes
    bytes.extend_from_slice(&32u16.to_le_bytes()); // bits per pixel
    bytes.extend_from_slice(&0u32.to_le_bytes()); // compression
    bytes.extend_from_slice(&(image_size as u32).to_le_bytes());
    bytes.extend_from_slice(&0i32.to_le_bytes()); // x resolution
    bytes.extend_from_slice(&0i32.to_le_bytes()); // y resolution
    bytes.extend_from_slice(&0u32.to_le_bytes()); // palette colors
    bytes.extend_from_slice(&0u32.to_le_bytes()); // important colors
    bytes.extend_from_slice(&raw[..image_size]);

    Ok(ImageData {
        bytes,
        kind: ImageKind::Bmp,
    })
}
