// Copyright 2025 rig Authors
// SPDX-License-Identifier: Apache-2.0

//! Encoded screenshot container
//!
//! The network layer only ever sees complete image files; the kind
//! selects the response MIME type.

pub mod bmp;
pub mod png;

use std::fs;
use std::io;
use std::path::PathBuf;

use uuid::Uuid;

/// Length of the random stem of a screenshot temp-file name.
const TEMP_NAME_LEN: usize = 25;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Bmp,
    None,
}

/// A complete encoded image file.
#[derive(Clone, Debug)]
pub struct ImageData {
    pub bytes: Vec<u8>,
    pub kind: ImageKind,
}

impl ImageData {
    pub fn empty() -> Self {
        Self {
            bytes: Vec::new(),
            kind: ImageKind::None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn extension(&self) -> &'static str {
        match self.kind {
            ImageKind::Png => "png",
            ImageKind::Bmp => "bmp",
            ImageKind::None => "",
        }
    }

    /// Write the image to the system temp directory under a random
    /// name. The caller (the network layer) deletes the file once the
    /// response is flushed.
    pub fn save_to_temp(&self) -> io::Result<PathBuf> {
        let mut stem = Uuid::new_v4().simple().to_string();
        stem.truncate(TEMP_NAME_LEN);
        let path = std::env::temp_dir().join(format!("{stem}.{}", self.extension()));
        fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}
