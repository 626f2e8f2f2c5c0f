//! Sensorpanel Core Library
//!
//! Board-agnostic half of the dashboard panel firmware: moves what the GUI
//! renderer draws into the panel's frame buffers without tearing.
//!
//! A refresh cycle flows through:
//! 1. [`render_loop::RenderLoop`] runs the renderer under the [`lock::RendererLock`]
//! 2. [`flush::FlushCoordinator`] copies dirty regions through the
//!    [`rotation::RotationEngine`] into a slot from the [`pool::FrameBufferPool`]
//! 3. The display driver scans the slot out and reports vsync to the
//!    [`vsync::VsyncNotifier`], which releases the previous slot
//!
//! Sensor readings from the host reach the widgets through [`ingest`].
//!
//! Hardware sits behind the traits in [`traits`]; everything here builds and
//! tests on the host.

#![no_std]
#![deny(unsafe_code)]

mod log;

pub mod config;
pub mod dirty;
pub mod flush;
pub mod geometry;
pub mod ingest;
pub mod lock;
pub mod pool;
pub mod render_loop;
pub mod rotation;
pub mod traits;
pub mod vsync;

#[cfg(test)]
mod testutil;

// Host tests link the std critical-section implementation
#[cfg(test)]
use critical_section as _;

pub use sensorpanel_protocol as protocol;
