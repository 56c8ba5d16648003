// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for camera capture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │        ScannerScreen (UI thread)             │
//! └────────────────────┬────────────────────────┘
//!                      │ start / stop / torch
//! ┌────────────────────┴────────────────────────┐
//! │              Camera backend                  │
//! │  ┌─────────────┐    ┌──────────────────┐   │
//! │  │  PipeWire   │    │      V4L2        │   │
//! │  │ pipewiresrc │    │     v4l2src      │   │
//! │  └─────────────┘    └──────────────────┘   │
//! └────────────────────┬────────────────────────┘
//!                      │ RGBA frames
//!               PreviewSurface channel
//! ```
//!
//! - [`camera`]: device enumeration, capture sessions and V4L2 controls

pub mod camera;
