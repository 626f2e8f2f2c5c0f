//! Display driver trait
//!
//! Panel bring-up and register programming live behind this trait; the
//! pipeline only hands over finished pixels.

use crate::geometry::Area;
use crate::pool::SlotId;

/// Errors reported by the display driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverError {
    /// Panel or bus not responding
    Unreachable,
    /// Slot index outside the driver's buffer set
    InvalidSlot,
    /// Transfer could not be started
    Transfer,
}

/// Trait for RGB panel drivers
///
/// Transmission is asynchronous: both methods return once the transfer is
/// queued. Completion is reported by calling `VsyncNotifier::on_vsync` from
/// the driver's interrupt.
pub trait DisplayDriver {
    /// Make `slot` the buffer the panel scans out from
    ///
    /// `pixels` is the slot's full physical frame.
    fn switch_active_buffer(&mut self, slot: SlotId, pixels: &[u8]) -> Result<(), DriverError>;

    /// Transmit `area` of the single on-screen frame buffer
    ///
    /// `pixels` is the whole physical frame; the driver reads only `area`.
    fn draw_region(&mut self, area: Area, pixels: &[u8]) -> Result<(), DriverError>;
}
