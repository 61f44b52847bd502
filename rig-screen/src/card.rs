// Copyright 2025 rig Authors
// SPDX-License-Identifier: Apache-2.0

//! DRM card node wrapper.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::{AsFd, BorrowedFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

/// A DRM device node. Implementing `AsFd` is the prerequisite for the
/// `drm` crate's device traits; both are blanket-implemented on top.
#[derive(Debug)]
pub struct Card(File);

impl AsFd for Card {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.0.as_fd()
    }
}

impl drm::Device for Card {}
impl drm::control::Device for Card {}

impl Card {
    /// Open read-write with close-on-exec, the mode used for capture
    /// and page flipping.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_CLOEXEC)
            .open(path)?;
        Ok(Card(file))
    }

    /// Open read-only, sufficient for resource enumeration.
    pub fn open_readonly(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).open(path)?;
        Ok(Card(file))
    }

    pub fn file(&self) -> &File {
        &self.0
    }
}
