// Copyright 2025 rig Authors
// SPDX-License-Identifier: Apache-2.0

//! Uinput Virtual-Device Factory
//!
//! Creates the process-wide triple of virtual input devices at backend
//! initialisation: a relative mouse, a keyboard covering the standard
//! scancode range, and an absolute multi-touch touchscreen. Each device
//! lives in the kernel for as long as its `/dev/uinput` descriptor stays
//! open; the descriptors are held for the process lifetime.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::mem;
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::slice;

use libc::{c_int, c_ulong};
use log::info;

use crate::event::{abs, btn, ev, key, rel, BUS_USB};
use crate::{InputError, Result};

const UINPUT_PATH: &str = "/dev/uinput";
const UINPUT_MAX_NAME_SIZE: usize = 80;

const VENDOR_ID: u16 = 0x1234;
const PRODUCT_ID: u16 = 0x5678;

// Ref: linux/uinput.h
const UI_SET_EVBIT: c_ulong = 0x4004_5564;
const UI_SET_KEYBIT: c_ulong = 0x4004_5565;
const UI_SET_RELBIT: c_ulong = 0x4004_5566;
const UI_SET_ABSBIT: c_ulong = 0x4004_5567;
const UI_DEV_SETUP: c_ulong = 0x405c_5503;
const UI_DEV_CREATE: c_ulong = 0x5501;

// Ref: linux/input.h and linux/uinput.h
#[repr(C)]
#[derive(Clone, Copy)]
pub struct InputId {
    pub bustype: u16,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
}

#[repr(C)]
pub struct UinputSetup {
    pub id: InputId,
    pub name: [u8; UINPUT_MAX_NAME_SIZE],
    pub ff_effects_max: u32,
}

/// Legacy setup record: the absolute axis ranges must reach the kernel
/// before `UI_DEV_CREATE`, which this record carries inline.
#[repr(C)]
pub struct UinputUserDev {
    pub name: [u8; UINPUT_MAX_NAME_SIZE],
    pub id: InputId,
    pub ff_effects_max: u32,
    pub absmax: [i32; abs::CNT],
    pub absmin: [i32; abs::CNT],
    pub absfuzz: [i32; abs::CNT],
    pub absflat: [i32; abs::CNT],
}

fn device_name(name: &str) -> [u8; UINPUT_MAX_NAME_SIZE] {
    let mut out = [0u8; UINPUT_MAX_NAME_SIZE];
    let bytes = name.as_bytes();
    out[..bytes.len()].copy_from_slice(bytes);
    out
}

fn device_id() -> InputId {
    InputId {
        bustype: BUS_USB,
        vendor: VENDOR_ID,
        product: PRODUCT_ID,
        version: 0,
    }
}

fn ioctl_set(file: &File, request: c_ulong, value: c_int) -> io::Result<()> {
    let rc = unsafe { libc::ioctl(file.as_raw_fd(), request, value) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn ioctl_with<T>(file: &File, request: c_ulong, payload: &T) -> io::Result<()> {
    let rc = unsafe { libc::ioctl(file.as_raw_fd(), request, payload as *const T) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn ioctl_bare(file: &File, request: c_ulong) -> io::Result<()> {
    let rc = unsafe { libc::ioctl(file.as_raw_fd(), request) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn open_uinput() -> Result<File> {
    OpenOptions::new()
        .write(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(UINPUT_PATH)
        .map_err(|e| InputError::DeviceUnavailable(format!("cannot open {UINPUT_PATH}: {e}")))
}

/// The virtual device triple. Logical event numbers route onto it as
/// 0 = mouse, 1 = keyboard, 2 = touchscreen.
pub struct VirtualDeviceSet {
    pub mouse: File,
    pub keyboard: File,
    pub touch: File,
}

impl VirtualDeviceSet {
    /// Create all three devices; any single failure is fatal.
    pub fn create() -> Result<Self> {
        let mouse = create_mouse()?;
        let keyboard = create_keyboard()?;
        let touch = create_touch_device()?;
        info!("created virtual mouse, keyboard and touchscreen devices");
        Ok(Self {
            mouse,
            keyboard,
            touch,
        })
    }
}

fn create_mouse() -> Result<File> {
    let file = open_uinput()?;

    ioctl_set(&file, UI_SET_EVBIT, ev::KEY as c_int)?;
    ioctl_set(&file, UI_SET_KEYBIT, btn::LEFT as c_int)?;
    ioctl_set(&file, UI_SET_KEYBIT, btn::RIGHT as c_int)?;
    ioctl_set(&file, UI_SET_EVBIT, ev::REL as c_int)?;
    ioctl_set(&file, UI_SET_RELBIT, rel::X as c_int)?;
    ioctl_set(&file, UI_SET_RELBIT, rel::Y as c_int)?;

    let setup = UinputSetup {
        id: device_id(),
        name: device_name("rig mouse device"),
        ff_effects_max: 0,
    };
    ioctl_with(&file, UI_DEV_SETUP, &setup)?;
    ioctl_bare(&file, UI_DEV_CREATE)?;

    Ok(file)
}

fn create_keyboard() -> Result<File> {
    let file = open_uinput()?;

    ioctl_set(&file, UI_SET_EVBIT, ev::KEY as c_int)?;
    for code in key::ESC..=key::RIGHT {
        ioctl_set(&file, UI_SET_KEYBIT, code as c_int)?;
    }

    let setup = UinputSetup {
        id: device_id(),
        name: device_name("rig keyboard device"),
        ff_effects_max: 0,
    };
    ioctl_with(&file, UI_DEV_SETUP, &setup)?;
    ioctl_bare(&file, UI_DEV_CREATE)?;

    Ok(file)
}

fn create_touch_device() -> Result<File> {
    let mut file = open_uinput()?;

    ioctl_set(&file, UI_SET_EVBIT, ev::ABS as c_int)?;
    ioctl_set(&file, UI_SET_ABSBIT, abs::MT_PRESSURE as c_int)?;
    ioctl_set(&file, UI_SET_ABSBIT, abs::MT_TRACKING_ID as c_int)?;
    ioctl_set(&file, UI_SET_ABSBIT, abs::MT_POSITION_X as c_int)?;
    ioctl_set(&file, UI_SET_ABSBIT, abs::MT_POSITION_Y as c_int)?;
    ioctl_set(&file, UI_SET_ABSBIT, abs::X as c_int)?;
    ioctl_set(&file, UI_SET_ABSBIT, abs::Y as c_int)?;
    ioctl_set(&file, UI_SET_ABSBIT, abs::MT_SLOT as c_int)?;
    ioctl_set(&file, UI_SET_EVBIT, ev::KEY as c_int)?;
    ioctl_set(&file, UI_SET_KEYBIT, btn::TOUCH as c_int)?;

    let mut setup = UinputUserDev {
        name: device_name("rig touchinput device"),
        id: device_id(),
        ff_effects_max: 0,
        absmax: [0; abs::CNT],
        absmin: [0; abs::CNT],
        absfuzz: [0; abs::CNT],
        absflat: [0; abs::CNT],
    };
    for axis in [
        abs::X,
        abs::Y,
        abs::MT_POSITION_X,
        abs::MT_POSITION_Y,
    ] {
        setup.absmax[axis as usize] = 32767;
    }
    setup.absmax[abs::MT_PRESSURE as usize] = 100;

    // axis ranges must be in the kernel before the create ioctl
    let bytes = unsafe {
        slice::from_raw_parts(
            &setup as *const UinputUserDev as *const u8,
            mem::size_of::<UinputUserDev>(),
        )
    };
    file.write_all(bytes)?;
    ioctl_bare(&file, UI_DEV_CREATE)?;

    Ok(file)
}
