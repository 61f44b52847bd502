// Copyright 2025 rig Authors
// SPDX-License-Identifier: Apache-2.0

//! Rig Agent
//!
//! Daemon glue for the rig test fixture: runtime configuration, the
//! process-wide backend registry, and event-number resolution. The
//! HTTP/WebSocket dispatch layer is an external collaborator that calls
//! into [`registry`].

pub mod config;
pub mod registry;

pub use config::RuntimeConfig;
