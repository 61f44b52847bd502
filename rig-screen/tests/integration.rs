// Copyright 2025 rig Authors
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for the screen subsystem
//!
//! Encoders are exercised with synthetic framebuffer contents and the
//! results decoded back; DRM paths that need real hardware are covered
//! down to the device boundary.

use rig_screen::image::{bmp, png as png_encode};
use rig_screen::{ImageData, ImageKind, ScreenError, ScreenKind};

/// PNG file signature.
const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a];

/// Build a BGRX test frame: pixel (x, y) stores (b, g, r) = (x, y, x+y).
fn bgrx_frame(width: usize, height: usize, pitch: usize) -> Vec<u8> {
    let mut frame = vec![0u8; pitch * height];
    for y in 0..height {
        for x in 0..width {
            let offset = y * pitch + x * 4;
            frame[offset] = x as u8;
            frame[offset + 1] = y as u8;
            frame[offset + 2] = (x + y) as u8;
            frame[offset + 3] = 0xff;
        }
    }
    frame
}

// ============================================================================
// PNG Encoder Tests
// ============================================================================

#[test]
fn png_output_carries_signature() {
    let frame = bgrx_frame(4, 4, 16);
    let image = png_encode::encode(&frame, 4, 4, 16, 32, false).unwrap();
    assert_eq!(image.kind, ImageKind::Png);
    assert_eq!(&image.bytes[..8], &PNG_MAGIC);
}

#[test]
fn png_decodes_to_source_raster() {
    let (width, height, pitch) = (8u32, 6u32, 32usize);
    let frame = bgrx_frame(8, 6, pitch);
    let image = png_encode::encode(&frame, width, height, pitch as u32, 32, false).unwrap();

    let decoder = png::Decoder::new(image.bytes.as_slice());
    let mut reader = decoder.read_info().unwrap();
    let mut pixels = vec![0u8; reader.output_buffer_size()];
    let info = reader.next_frame(&mut pixels).unwrap();

    assert_eq!(info.width, width);
    assert_eq!(info.height, height);
    assert_eq!(info.color_type, png::ColorType::Rgb);

    // BGR source, so red in the output is the byte at offset 2
    for y in 0..height as usize {
        for x in 0..width as usize {
            let px = &pixels[(y * width as usize + x) * 3..][..3];
            assert_eq!(px, &[(x + y) as u8, y as u8, x as u8]);
        }
    }
}

#[test]
fn png_respects_rgb_flag() {
    let mut frame = vec![0u8; 4];
    frame[0] = 10; // first channel
    frame[2] = 30; // third channel
    let image = png_encode::encode(&frame, 1, 1, 4, 32, true).unwrap();

    let decoder = png::Decoder::new(image.bytes.as_slice());
    let mut reader = decoder.read_info().unwrap();
    let mut pixels = vec![0u8; reader.output_buffer_size()];
    reader.next_frame(&mut pixels).unwrap();
    // rgb source passes through unswapped
    assert_eq!(&pixels[..3], &[10, 0, 30]);
}

#[test]
fn png_handles_padded_pitch() {
    // 3 pixels per row, pitch padded to 4 pixels' worth
    let frame = bgrx_frame(3, 2, 16);
    let image = png_encode::encode(&frame, 3, 2, 16, 32, false).unwrap();

    let decoder = png::Decoder::new(image.bytes.as_slice());
    let mut reader = decoder.read_info().unwrap();
    let info = reader.info();
    assert_eq!(info.width, 3);
    assert_eq!(info.height, 2);
}

#[test]
fn png_rejects_short_buffer() {
    let frame = vec![0u8; 10];
    let result = png_encode::encode(&frame, 4, 4, 16, 32, false);
    assert!(matches!(result, Err(ScreenError::Encode(_))));
}

#[test]
fn png_rejects_odd_depths() {
    let frame = vec![0u8; 64];
    let result = png_encode::encode(&frame, 4, 4, 8, 16, false);
    assert!(matches!(result, Err(ScreenError::Encode(_))));
}

// ============================================================================
// BMP Encoder Tests
// ============================================================================

#[test]
fn bmp_round_trip() {
    let (width, height) = (4i32, 3i32);
    let stride = 16u32; // 4 * width
    let raw: Vec<u8> = (0..stride * height as u32).map(|i| i as u8).collect();

    let image = bmp::encode(&raw, width, height, stride).unwrap();
    assert_eq!(image.kind, ImageKind::Bmp);

    let bytes = &image.bytes;
    assert_eq!(&bytes[..2], b"BM");
    let file_size = u32::from_le_bytes(bytes[2..6].try_into().unwrap());
    assert_eq!(file_size as usize, bytes.len());
    let data_offset = u32::from_le_bytes(bytes[10..14].try_into().unwrap());
    assert_eq!(data_offset, 54);
    let info_size = u32::from_le_bytes(bytes[14..18].try_into().unwrap());
    assert_eq!(info_size, 40);
    assert_eq!(i32::from_le_bytes(bytes[18..22].try_into().unwrap()), width);
    assert_eq!(i32::from_le_bytes(bytes[22..26].try_into().unwrap()), height);
    let planes = u16::from_le_bytes(bytes[26..28].try_into().unwrap());
    assert_eq!(planes, 1);
    let bpp = u16::from_le_bytes(bytes[28..30].try_into().unwrap());
    assert_eq!(bpp, 32);
    let compression = u32::from_le_bytes(bytes[30..34].try_into().unwrap());
    assert_eq!(compression, 0);
    let image_size = u32::from_le_bytes(bytes[34..38].try_into().unwrap());
    assert_eq!(image_size, stride * height as u32);

    // pixel payload survives byte-for-byte
    assert_eq!(&bytes[data_offset as usize..], raw.as_slice());
}

// ============================================================================
// ImageData Tests
// ============================================================================

#[test]
fn empty_image_has_no_kind() {
    let image = ImageData::empty();
    assert!(image.is_empty());
    assert_eq!(image.kind, ImageKind::None);
    assert_eq!(image.extension(), "");
}

#[test]
fn image_extensions() {
    let png_image = ImageData {
        bytes: vec![1],
        kind: ImageKind::Png,
    };
    assert_eq!(png_image.extension(), "png");
    let bmp_image = ImageData {
        bytes: vec![1],
        kind: ImageKind::Bmp,
    };
    assert_eq!(bmp_image.extension(), "bmp");
}

#[test]
fn temp_files_use_random_25_char_names() {
    let image = ImageData {
        bytes: vec![0xAA; 32],
        kind: ImageKind::Png,
    };
    let path = image.save_to_temp().unwrap();
    let stem = path.file_stem().unwrap().to_str().unwrap();
    assert_eq!(stem.len(), 25);
    assert_eq!(path.extension().unwrap(), "png");
    assert_eq!(std::fs::read(&path).unwrap(), image.bytes);
    std::fs::remove_file(path).unwrap();
}

// ============================================================================
// Backend Kind Tests
// ============================================================================

#[test]
fn screen_kind_parsing() {
    assert_eq!(ScreenKind::from_name("kms"), Some(ScreenKind::Kms));
    assert_eq!(ScreenKind::from_name("DRM"), Some(ScreenKind::Kms));
    assert_eq!(ScreenKind::from_name("ilm"), Some(ScreenKind::Ilm));
    assert_eq!(ScreenKind::from_name("x11"), None);
}

// ============================================================================
// Device-Boundary Tests
// ============================================================================

#[test]
fn listing_a_missing_card_fails_cleanly() {
    let result = rig_screen::kms::list_crtcs(std::path::Path::new("/dev/dri/card-does-not-exist"));
    assert!(matches!(result, Err(ScreenError::DeviceUnavailable(_))));
}

#[test]
fn snapshot_of_a_missing_card_fails_cleanly() {
    let result = rig_screen::capture::snapshot(
        std::path::Path::new("/dev/dri/card-does-not-exist"),
        2,
        false,
    );
    assert!(matches!(result, Err(ScreenError::DeviceUnavailable(_))));
}
