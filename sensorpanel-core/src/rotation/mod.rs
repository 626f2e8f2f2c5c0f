//! Rotation engine
//!
//! Copies a rectangle of the logical canvas into a physical frame buffer,
//! turning it by a quarter-turn multiple. For a source canvas `w × h`:
//!
//! | angle | destination of (x, y) | destination canvas |
//! |-------|-----------------------|--------------------|
//! | 0     | (x, y)                | w × h              |
//! | 90    | (h−1−y, x)            | h × w              |
//! | 180   | (w−1−x, h−1−y)        | w × h              |
//! | 270   | (y, w−1−x)            | h × w              |
//!
//! Both back ends produce bit-identical output and write nothing outside
//! the rotated rectangle.

mod accelerated;
pub mod software;

use crate::config::{PixelFormat, Rotation};
use crate::geometry::Area;
use crate::traits::{AccelError, RotationAccelerator};

/// Rotation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RotationError {
    /// Region not inside the source canvas
    RegionOutOfBounds,
    /// Source slice shorter than the canvas
    SourceTooSmall,
    /// Destination slice shorter than the rotated canvas
    DestinationTooSmall,
    /// Accelerator failed the operation
    Accelerator(AccelError),
}

impl From<AccelError> for RotationError {
    fn from(e: AccelError) -> Self {
        RotationError::Accelerator(e)
    }
}

/// Destination canvas size
pub const fn dest_size(src_w: u16, src_h: u16, rotation: Rotation) -> (u16, u16) {
    if rotation.swaps_axes() {
        (src_h, src_w)
    } else {
        (src_w, src_h)
    }
}

/// Destination of source pixel `(x, y)`
///
/// `(x, y)` must lie inside the `src_w × src_h` canvas.
#[inline]
pub(crate) const fn map_point(x: u16, y: u16, src_w: u16, src_h: u16, rotation: Rotation) -> (u16, u16) {
    debug_assert!(x < src_w && y < src_h);
    match rotation {
        Rotation::Deg0 => (x, y),
        Rotation::Deg90 => (src_h - 1 - y, x),
        Rotation::Deg180 => (src_w - 1 - x, src_h - 1 - y),
        Rotation::Deg270 => (y, src_w - 1 - x),
    }
}

/// Destination rectangle of `area`, which must lie inside the canvas
pub(crate) const fn rotated_area(area: Area, src_w: u16, src_h: u16, rotation: Rotation) -> Area {
    debug_assert!(area.x1 <= area.x2 && area.y1 <= area.y2 && area.x2 < src_w && area.y2 < src_h);
    let (w, h) = (src_w, src_h);
    match rotation {
        Rotation::Deg0 => area,
        Rotation::Deg90 => Area::new(h - 1 - area.y2, area.x1, h - 1 - area.y1, area.x2),
        Rotation::Deg180 => Area::new(w - 1 - area.x2, h - 1 - area.y2, w - 1 - area.x1, h - 1 - area.y1),
        Rotation::Deg270 => Area::new(area.y1, w - 1 - area.x2, area.y2, w - 1 - area.x1),
    }
}

/// Software or accelerator-backed region copy
pub enum RotationEngine<A> {
    Software,
    Accelerated(A),
}

impl<A: RotationAccelerator> RotationEngine<A> {
    /// Pick the back end; falls back to software without an accelerator
    pub fn new(accelerator: Option<A>, use_hardware: bool) -> Self {
        match accelerator {
            Some(accel) if use_hardware => RotationEngine::Accelerated(accel),
            _ => RotationEngine::Software,
        }
    }

    pub fn is_accelerated(&self) -> bool {
        matches!(self, RotationEngine::Accelerated(_))
    }

    /// Copy `region` of the `src_w × src_h` canvas `src` into `dst`
    ///
    /// Returns the rectangle written in `dst`. Angle 0 is always a plain
    /// row copy.
    #[allow(clippy::too_many_arguments)]
    pub fn copy_rotated(
        &mut self,
        src: &[u8],
        dst: &mut [u8],
        region: Area,
        src_w: u16,
        src_h: u16,
        rotation: Rotation,
        format: PixelFormat,
    ) -> Result<Area, RotationError> {
        if !region.fits_within(src_w, src_h) {
            return Err(RotationError::RegionOutOfBounds);
        }
        let canvas = src_w as usize * src_h as usize * format.bytes_per_pixel();
        if src.len() < canvas {
            return Err(RotationError::SourceTooSmall);
        }
        if dst.len() < canvas {
            return Err(RotationError::DestinationTooSmall);
        }

        match self {
            RotationEngine::Accelerated(accel) if rotation != Rotation::Deg0 => {
                accelerated::copy_region(accel, src, dst, region, src_w, src_h, rotation, format)?;
            }
            _ => software::copy_region(
                src,
                dst,
                region,
                src_w,
                src_h,
                rotation,
                format.bytes_per_pixel(),
            ),
        }

        Ok(rotated_area(region, src_w, src_h, rotation))
    }
}
