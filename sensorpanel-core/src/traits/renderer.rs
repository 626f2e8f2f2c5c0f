//! Renderer traits
//!
//! The GUI library is opaque to the pipeline. It draws into a canvas the
//! size of the logical screen and reports what it redrew.

use sensorpanel_protocol::{Screen, WidgetUpdate};

use crate::geometry::Area;

/// One invalidated rectangle of the current refresh cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidArea {
    pub area: Area,
    /// Merged into another rectangle; excluded from area totals
    pub joined: bool,
}

impl InvalidArea {
    pub const fn new(area: Area) -> Self {
        Self { area, joined: false }
    }
}

/// A flush the renderer wants performed
#[derive(Debug, Clone, Copy)]
pub struct FlushRequest<'a> {
    /// Region redrawn for this flush, in logical coordinates
    pub area: Area,
    /// Whole logical canvas
    pub pixels: &'a [u8],
    /// Last flush of the refresh cycle
    pub last: bool,
    /// Every rectangle invalidated this cycle
    pub invalidated: &'a [InvalidArea],
}

/// Trait for the GUI renderer driven by the render loop
pub trait Renderer {
    /// Run timers and redraw; returns the delay (ms) until the next call
    fn handle_timers(&mut self) -> u32;

    /// Next pending flush, if any
    fn take_flush(&mut self) -> Option<FlushRequest<'_>>;

    /// Acknowledge the flush returned by the last `take_flush`
    fn flush_ready(&mut self);

    /// Invalidate the whole screen so the next cycle redraws everything
    fn request_full_refresh(&mut self);
}

/// Trait for the dashboard side of the renderer
///
/// Called with the renderer lock held.
pub trait WidgetSink {
    /// Apply one decoded sensor update
    fn apply(&mut self, update: &WidgetUpdate);

    /// Switch to `screen`
    fn load_screen(&mut self, screen: Screen);

    /// Replace the status text on the loading screen
    fn set_loading_text(&mut self, text: &str);
}
