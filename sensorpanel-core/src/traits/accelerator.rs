//! Scale/rotate/mirror accelerator trait

use crate::config::PixelFormat;

/// Accelerator errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccelError {
    /// No accelerator on this board
    Unsupported,
    /// Engine did not complete the operation
    Timeout,
    /// Engine rejected the operation parameters
    InvalidOperation,
}

/// Accelerator rotation, in the engine's own (counter-clockwise) sense
///
/// Logical 90° is engine `Deg270` and logical 270° is engine `Deg90`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccelAngle {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

/// One blocking accelerator job: rotate a block of `src` into `dst`
///
/// Scale is fixed at 1:1 and mirroring is off; the pipeline only rotates.
/// Coordinates are in pixels.
pub struct SrmOperation<'a> {
    pub src: &'a [u8],
    pub src_width: u16,
    pub src_height: u16,
    /// Top-left of the source block
    pub block_x: u16,
    pub block_y: u16,
    pub block_width: u16,
    pub block_height: u16,
    pub dst: &'a mut [u8],
    /// Output picture size (already swapped for quarter turns)
    pub dst_width: u16,
    pub dst_height: u16,
    /// Where the rotated block lands in `dst`
    pub dst_x: u16,
    pub dst_y: u16,
    pub format: PixelFormat,
    pub angle: AccelAngle,
}

/// Trait for a hardware 2D rotation engine
pub trait RotationAccelerator {
    /// Run one operation to completion
    fn scale_rotate_mirror(&mut self, op: SrmOperation<'_>) -> Result<(), AccelError>;
}

/// Stand-in for boards without an accelerator
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAccelerator;

impl RotationAccelerator for NoAccelerator {
    fn scale_rotate_mirror(&mut self, _op: SrmOperation<'_>) -> Result<(), AccelError> {
        Err(AccelError::Unsupported)
    }
}
