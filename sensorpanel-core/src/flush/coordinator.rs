//! Flush coordinator
//!
//! Moves a finished canvas into the frame buffer pool without the panel
//! ever scanning out a half-written slot:
//!
//! - `Single`: copy the region into the on-screen buffer and draw it
//! - `DoubleDirect`: copy the cycle's dirty rectangles into the off-screen
//!   slot, present, wait for vsync, then mirror the same rectangles into
//!   the slot that just left the screen
//! - `DoubleFull`: copy the whole frame, present, wait for vsync
//! - `TripleFull`: copy the whole frame, present, carry on
//!
//! Every copy goes through the rotation engine. A slot is only presented
//! after its copy completed, so a failed cycle leaves a stale frame on the
//! panel, never a torn one.

use embassy_time::Duration;
use heapless::Vec;

use crate::config::{BufferingMode, ConfigError, DisplayConfig, Rotation, MAX_FRAME_BUFFERS};
use crate::dirty::{CopyProbe, DirtyAreas, DirtyTracker, MAX_DIRTY_AREAS};
use crate::geometry::Area;
use crate::log::{debug, error, warn};
use crate::pool::{FrameBufferPool, SlotId};
use crate::rotation::{RotationEngine, RotationError};
use crate::traits::{DisplayDriver, DriverError, FlushRequest, InvalidArea, RotationAccelerator};
use crate::vsync::VsyncNotifier;

use super::state::{FlushEvent, FlushState};

/// Flush errors; each one drops the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlushError {
    /// Driver refused the buffer or region
    Driver(DriverError),
    /// Copy into the slot failed
    Rotation(RotationError),
    /// Panel never confirmed the presented slot
    VsyncTimeout,
    /// Every slot is on screen or in flight
    NoFreeSlot,
}

impl From<DriverError> for FlushError {
    fn from(e: DriverError) -> Self {
        FlushError::Driver(e)
    }
}

impl From<RotationError> for FlushError {
    fn from(e: RotationError) -> Self {
        FlushError::Rotation(e)
    }
}

/// What a successful flush did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlushOutcome {
    /// Region drawn straight into the single buffer
    Drawn,
    /// A slot was presented
    Presented(SlotId),
    /// Not the last region of the cycle; nothing to do yet
    Deferred,
    /// Frame skipped; the renderer should redraw the whole screen
    FullRefreshRequested,
}

/// Running counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlushStats {
    pub presented: u32,
    pub dropped: u32,
    pub vsync_timeouts: u32,
}

/// Per-refresh state machine over the pool, driver and rotation engine
pub struct FlushCoordinator<'a, D, A, B> {
    mode: BufferingMode,
    pool: FrameBufferPool<'a, B>,
    driver: D,
    engine: RotationEngine<A>,
    vsync: &'a VsyncNotifier<'a>,
    tracker: DirtyTracker,
    state: FlushState,
    rotation: Rotation,
    logical: (u16, u16),
    vsync_timeout: Duration,
    /// Rectangles of a cycle dropped for a forced full refresh
    forced_full: Option<DirtyAreas>,
    /// Rectangles the off-screen slot is known to be missing
    unsynced: Option<DirtyAreas>,
    stats: FlushStats,
}

impl<'a, D, A, B> FlushCoordinator<'a, D, A, B>
where
    D: DisplayDriver,
    A: RotationAccelerator,
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    /// Build a coordinator for a validated configuration
    ///
    /// The pool must hold as many `h_res × v_res` buffers as the derived
    /// buffering mode needs. The accelerator is only used when
    /// `hw_rotation` is set.
    pub fn new(
        config: &DisplayConfig,
        pool: FrameBufferPool<'a, B>,
        driver: D,
        accelerator: Option<A>,
        vsync: &'a VsyncNotifier<'a>,
    ) -> Result<Self, ConfigError> {
        let mode = config.validate()?;
        if pool.len() != mode.buffer_count() {
            return Err(ConfigError::InvalidBufferCount);
        }
        if (pool.width(), pool.height()) != config.physical_size() || pool.format() != config.pixel_format {
            return Err(ConfigError::InvalidResolution);
        }

        let engine = RotationEngine::new(accelerator, config.hw_rotation);
        let logical = config.logical_size();
        debug!(
            "flush coordinator: {:?}, {}x{} logical, rotation {}, accelerated {}",
            mode,
            logical.0,
            logical.1,
            config.rotation.degrees(),
            engine.is_accelerated()
        );

        Ok(Self {
            mode,
            pool,
            driver,
            engine,
            vsync,
            tracker: DirtyTracker::new(
                logical.0,
                logical.1,
                config.full_copy_threshold_pct,
                config.large_update_full_copy,
            ),
            state: FlushState::Idle,
            rotation: config.rotation,
            logical,
            vsync_timeout: Duration::from_millis(config.vsync_timeout_ms as u64),
            forced_full: None,
            unsynced: None,
            stats: FlushStats::default(),
        })
    }

    pub fn mode(&self) -> BufferingMode {
        self.mode
    }

    pub fn state(&self) -> FlushState {
        self.state
    }

    pub fn stats(&self) -> FlushStats {
        self.stats
    }

    pub fn pool(&self) -> &FrameBufferPool<'a, B> {
        &self.pool
    }

    /// Rotation runs on the accelerator
    pub fn is_accelerated(&self) -> bool {
        self.engine.is_accelerated()
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Perform one flush request
    ///
    /// Always returns to `Idle`; the caller acknowledges the renderer
    /// whatever the result.
    pub async fn flush(&mut self, request: &FlushRequest<'_>) -> Result<FlushOutcome, FlushError> {
        let result = match self.mode {
            BufferingMode::Single => self.flush_single(request),
            BufferingMode::DoubleDirect => self.flush_direct(request).await,
            BufferingMode::DoubleFull | BufferingMode::TripleFull => self.flush_full(request).await,
        };

        match &result {
            Ok(FlushOutcome::Presented(_)) => self.stats.presented += 1,
            Ok(_) => {}
            Err(e) => {
                self.stats.dropped += 1;
                warn!("frame dropped: {:?}", e);
            }
        }
        if self.state == FlushState::Idle {
            self.step(FlushEvent::CycleDropped);
        }
        self.step(FlushEvent::Acknowledged);
        result
    }

    fn step(&mut self, event: FlushEvent) {
        self.state = self.state.transition(event);
    }

    fn flush_single(&mut self, request: &FlushRequest<'_>) -> Result<FlushOutcome, FlushError> {
        let slot = self.pool.acquire_next_target().ok_or(FlushError::NoFreeSlot)?;
        let written = copy_areas(
            &mut self.engine,
            &mut self.pool,
            slot,
            request.pixels,
            self.logical,
            self.rotation,
            core::iter::once(request.area),
        )?;
        let frame = self.pool.slot(slot).ok_or(DriverError::InvalidSlot)?;
        if let Some(area) = written {
            self.driver.draw_region(area, frame)?;
        }
        self.step(FlushEvent::CopiedInPlace);
        Ok(FlushOutcome::Drawn)
    }

    async fn flush_direct(&mut self, request: &FlushRequest<'_>) -> Result<FlushOutcome, FlushError> {
        if !request.last {
            return Ok(FlushOutcome::Deferred);
        }

        // Second half of a forced refresh: whole frame, then the saved
        // rectangles into the other slot
        if let Some(saved) = self.forced_full.take() {
            let full = Area::full(self.logical.0, self.logical.1);
            let slot = match self.fill_and_present(request.pixels, core::iter::once(full)).await {
                Ok(slot) => slot,
                Err(e) => {
                    self.remember_unsynced(&[full]);
                    return Err(e);
                }
            };
            if let Err(e) = self.propagate(slot, request.pixels, saved.iter().filter(|a| !a.joined).map(|a| a.area)) {
                self.unsynced = Some(saved);
                return Err(e);
            }
            return Ok(FlushOutcome::Presented(slot));
        }

        self.tracker.record(request.invalidated);
        let probe = self.tracker.probe();
        if probe == CopyProbe::FullCopy {
            debug!("large update after full refresh, forcing full copy");
            self.forced_full = Some(self.tracker.snapshot());
            return Ok(FlushOutcome::FullRefreshRequested);
        }

        let mut areas: Vec<Area, { 2 * MAX_DIRTY_AREAS }> = Vec::new();
        for area in self.tracker.dirty_areas() {
            let _ = areas.push(area);
        }
        if let Some(missing) = self.unsynced.take() {
            for a in missing.iter().filter(|a| !a.joined) {
                let _ = areas.push(a.area);
            }
        }

        let slot = match self.fill_and_present(request.pixels, areas.iter().copied()).await {
            Ok(slot) => slot,
            Err(e) => {
                self.remember_unsynced(&areas);
                return Err(e);
            }
        };

        if probe == CopyProbe::PartCopy {
            if let Err(e) = self.propagate(slot, request.pixels, areas.iter().copied()) {
                // Presented slot is complete; the others still lack `areas`
                self.remember_unsynced(&areas);
                return Err(e);
            }
        }
        Ok(FlushOutcome::Presented(slot))
    }

    async fn flush_full(&mut self, request: &FlushRequest<'_>) -> Result<FlushOutcome, FlushError> {
        if !request.last {
            return Ok(FlushOutcome::Deferred);
        }
        let full = Area::full(self.logical.0, self.logical.1);
        let slot = self.fill_and_present(request.pixels, core::iter::once(full)).await?;
        Ok(FlushOutcome::Presented(slot))
    }

    /// Acquire a slot, copy `areas` into it, present it and, in blocking
    /// modes, wait for the panel to confirm it
    async fn fill_and_present<I>(&mut self, canvas: &[u8], areas: I) -> Result<SlotId, FlushError>
    where
        I: Iterator<Item = Area>,
    {
        let slot = self
            .pool
            .acquire_next_target_within(self.vsync, self.vsync_timeout)
            .await
            .ok_or(FlushError::NoFreeSlot)?;

        copy_areas(
            &mut self.engine,
            &mut self.pool,
            slot,
            canvas,
            self.logical,
            self.rotation,
            areas,
        )?;

        let wait_vsync = self.mode.waits_for_vsync();
        self.vsync.arm();
        self.step(FlushEvent::BufferHanded);
        if let Err(e) = self.pool.present(slot, &mut self.driver) {
            error!("driver refused slot {}: {:?}", slot.index(), e);
            self.step(FlushEvent::DriverFailed);
            return Err(e.into());
        }
        self.step(FlushEvent::DriverAccepted { wait_vsync });

        if self.state.is_waiting() {
            if self.vsync.wait_within(self.vsync_timeout).await.is_err() {
                error!("no vsync for slot {} within {} ms", slot.index(), self.vsync_timeout.as_millis());
                self.stats.vsync_timeouts += 1;
                self.step(FlushEvent::VsyncTimedOut);
                return Err(FlushError::VsyncTimeout);
            }
            self.step(FlushEvent::VsyncConfirmed);
        }
        Ok(slot)
    }

    /// Mirror `areas` into every off-screen slot other than `presented`
    fn propagate<I>(&mut self, presented: SlotId, canvas: &[u8], areas: I) -> Result<(), FlushError>
    where
        I: Iterator<Item = Area> + Clone,
    {
        let others: Vec<SlotId, MAX_FRAME_BUFFERS> = self.pool.others(presented).collect();
        for slot in others {
            copy_areas(
                &mut self.engine,
                &mut self.pool,
                slot,
                canvas,
                self.logical,
                self.rotation,
                areas.clone(),
            )?;
        }
        Ok(())
    }

    fn remember_unsynced(&mut self, areas: &[Area]) {
        let mut missing = DirtyAreas::new();
        for &area in areas {
            if missing.push(InvalidArea::new(area)).is_err() {
                missing.clear();
                let _ = missing.push(InvalidArea::new(Area::full(self.logical.0, self.logical.1)));
                break;
            }
        }
        self.unsynced = Some(missing);
    }
}

/// Copy each area of the logical canvas into `slot`
///
/// Returns the bounding box written in physical coordinates.
fn copy_areas<A, B, I>(
    engine: &mut RotationEngine<A>,
    pool: &mut FrameBufferPool<'_, B>,
    slot: SlotId,
    canvas: &[u8],
    (width, height): (u16, u16),
    rotation: Rotation,
    areas: I,
) -> Result<Option<Area>, FlushError>
where
    A: RotationAccelerator,
    B: AsRef<[u8]> + AsMut<[u8]>,
    I: Iterator<Item = Area>,
{
    let format = pool.format();
    let dst = pool.slot_mut(slot).ok_or(DriverError::InvalidSlot)?;
    let mut written: Option<Area> = None;
    for area in areas {
        let physical = engine.copy_rotated(canvas, dst, area, width, height, rotation, format)?;
        written = Some(written.map_or(physical, |w| w.union(&physical)));
    }
    Ok(written)
}
