//! Host-side doubles for the hardware traits

extern crate std;

use std::vec;
use std::vec::Vec;

use crate::geometry::Area;
use crate::pool::SlotId;
use crate::traits::{
    AccelAngle, AccelError, DisplayDriver, DriverError, FlushRequest, InvalidArea,
    RotationAccelerator, Renderer, SrmOperation, WidgetSink,
};
use crate::vsync::VsyncNotifier;
use sensorpanel_protocol::{Screen, WidgetUpdate};

/// Reference model of the scale/rotate/mirror engine
///
/// Engine angles are counter-clockwise; within a `bw × bh` block the local
/// pixel `(lx, ly)` lands at:
/// - 90:  `(ly, bw-1-lx)`
/// - 180: `(bw-1-lx, bh-1-ly)`
/// - 270: `(bh-1-ly, lx)`
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockRotator;

impl RotationAccelerator for BlockRotator {
    fn scale_rotate_mirror(&mut self, op: SrmOperation<'_>) -> Result<(), AccelError> {
        let bpp = op.format.bytes_per_pixel();
        let (bw, bh) = (op.block_width as usize, op.block_height as usize);
        for ly in 0..bh {
            for lx in 0..bw {
                let (ox, oy) = match op.angle {
                    AccelAngle::Deg0 => (lx, ly),
                    AccelAngle::Deg90 => (ly, bw - 1 - lx),
                    AccelAngle::Deg180 => (bw - 1 - lx, bh - 1 - ly),
                    AccelAngle::Deg270 => (bh - 1 - ly, lx),
                };
                let sx = op.block_x as usize + lx;
                let sy = op.block_y as usize + ly;
                let dx = op.dst_x as usize + ox;
                let dy = op.dst_y as usize + oy;
                if dx >= op.dst_width as usize || dy >= op.dst_height as usize {
                    return Err(AccelError::InvalidOperation);
                }
                let s = (sy * op.src_width as usize + sx) * bpp;
                let d = (dy * op.dst_width as usize + dx) * bpp;
                op.dst[d..d + bpp].copy_from_slice(&op.src[s..s + bpp]);
            }
        }
        Ok(())
    }
}

/// Accelerator that fails one chosen call and copies the rest
#[derive(Debug, Default)]
pub struct FlakyRotator {
    pub calls: usize,
    /// 1-based call number to fail
    pub fail_on: usize,
}

impl RotationAccelerator for FlakyRotator {
    fn scale_rotate_mirror(&mut self, op: SrmOperation<'_>) -> Result<(), AccelError> {
        self.calls += 1;
        if self.calls == self.fail_on {
            return Err(AccelError::Timeout);
        }
        BlockRotator.scale_rotate_mirror(op)
    }
}

/// Display driver that records every call
#[derive(Debug, Default)]
pub struct RecordingDriver {
    pub switched: Vec<SlotId>,
    pub regions: Vec<Area>,
    pub fail_switch: bool,
}

impl DisplayDriver for RecordingDriver {
    fn switch_active_buffer(&mut self, slot: SlotId, _pixels: &[u8]) -> Result<(), DriverError> {
        if self.fail_switch {
            return Err(DriverError::Unreachable);
        }
        self.switched.push(slot);
        Ok(())
    }

    fn draw_region(&mut self, area: Area, _pixels: &[u8]) -> Result<(), DriverError> {
        self.regions.push(area);
        Ok(())
    }
}

/// Panel that confirms every accepted buffer straight away
///
/// With `vsync` off the panel goes quiet and confirmations must be fired
/// by hand through the notifier.
pub struct LoopbackPanel<'a> {
    pub notifier: &'a VsyncNotifier<'a>,
    pub recorder: RecordingDriver,
    pub vsync: bool,
}

impl<'a> LoopbackPanel<'a> {
    pub fn new(notifier: &'a VsyncNotifier<'a>) -> Self {
        Self {
            notifier,
            recorder: RecordingDriver::default(),
            vsync: true,
        }
    }
}

impl DisplayDriver for LoopbackPanel<'_> {
    fn switch_active_buffer(&mut self, slot: SlotId, pixels: &[u8]) -> Result<(), DriverError> {
        self.recorder.switch_active_buffer(slot, pixels)?;
        if self.vsync {
            self.notifier.on_vsync();
        }
        Ok(())
    }

    fn draw_region(&mut self, area: Area, pixels: &[u8]) -> Result<(), DriverError> {
        self.recorder.draw_region(area, pixels)
    }
}

/// Widget sink that records what it was asked to show
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub updates: Vec<WidgetUpdate>,
    pub screens: Vec<Screen>,
    pub loading_text: Option<std::string::String>,
}

impl WidgetSink for RecordingSink {
    fn apply(&mut self, update: &WidgetUpdate) {
        self.updates.push(update.clone());
    }

    fn load_screen(&mut self, screen: Screen) {
        self.screens.push(screen);
    }

    fn set_loading_text(&mut self, text: &str) {
        self.loading_text = Some(text.into());
    }
}

/// One scripted flush
#[derive(Debug, Clone)]
pub struct ScriptedFlush {
    pub area: Area,
    pub last: bool,
    pub invalidated: Vec<InvalidArea>,
}

/// Renderer that replays scripted flushes over a fixed canvas
#[derive(Debug)]
pub struct ScriptedRenderer {
    pub canvas: Vec<u8>,
    pub queue: Vec<ScriptedFlush>,
    pub current: Option<ScriptedFlush>,
    pub delay_ms: u32,
    pub timer_calls: u32,
    pub acknowledged: u32,
    pub full_refresh_requests: u32,
}

impl ScriptedRenderer {
    pub fn new(canvas_len: usize) -> Self {
        Self {
            canvas: vec![0; canvas_len],
            queue: Vec::new(),
            current: None,
            delay_ms: 5,
            timer_calls: 0,
            acknowledged: 0,
            full_refresh_requests: 0,
        }
    }

    /// Queue one refresh cycle made of `areas`
    pub fn push_cycle(&mut self, areas: &[Area]) {
        let invalidated: Vec<InvalidArea> = areas.iter().copied().map(InvalidArea::new).collect();
        for (i, &area) in areas.iter().enumerate() {
            self.queue.push(ScriptedFlush {
                area,
                last: i + 1 == areas.len(),
                invalidated: invalidated.clone(),
            });
        }
    }
}

impl Renderer for ScriptedRenderer {
    fn handle_timers(&mut self) -> u32 {
        self.timer_calls += 1;
        self.delay_ms
    }

    fn take_flush(&mut self) -> Option<FlushRequest<'_>> {
        if self.queue.is_empty() {
            return None;
        }
        self.current = Some(self.queue.remove(0));
        let flush = self.current.as_ref()?;
        Some(FlushRequest {
            area: flush.area,
            pixels: &self.canvas,
            last: flush.last,
            invalidated: &flush.invalidated,
        })
    }

    fn flush_ready(&mut self) {
        self.acknowledged += 1;
    }

    fn request_full_refresh(&mut self) {
        self.full_refresh_requests += 1;
    }
}
