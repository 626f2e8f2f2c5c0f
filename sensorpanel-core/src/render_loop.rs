//! Render loop
//!
//! One task owns the renderer and the flush coordinator. Each iteration it
//! takes the renderer lock, lets the renderer run its timers, performs every
//! flush that produced, releases the lock and sleeps for the delay the
//! renderer asked for, clamped to the configured bounds.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Timer};

use crate::config::{ConfigError, RenderLoopConfig};
use crate::flush::{FlushCoordinator, FlushOutcome};
use crate::lock::RendererLock;
use crate::log::{debug, info};
use crate::traits::{DisplayDriver, Renderer, RotationAccelerator};

/// Render task state
pub struct RenderLoop<'a, M: RawMutex, R, D, A, B> {
    lock: &'a RendererLock<M, R>,
    coordinator: FlushCoordinator<'a, D, A, B>,
    config: RenderLoopConfig,
}

impl<'a, M, R, D, A, B> RenderLoop<'a, M, R, D, A, B>
where
    M: RawMutex,
    R: Renderer,
    D: DisplayDriver,
    A: RotationAccelerator,
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    pub fn new(
        lock: &'a RendererLock<M, R>,
        coordinator: FlushCoordinator<'a, D, A, B>,
        config: RenderLoopConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            lock,
            coordinator,
            config,
        })
    }

    pub fn coordinator(&self) -> &FlushCoordinator<'a, D, A, B> {
        &self.coordinator
    }

    /// One iteration; returns how long to sleep before the next
    pub async fn run_once(&mut self) -> Duration {
        let mut renderer = self.lock.lock().await;
        let requested = renderer.handle_timers();

        let mut flushes = 0u32;
        loop {
            let outcome = {
                let Some(request) = renderer.take_flush() else {
                    break;
                };
                self.coordinator.flush(&request).await
            };
            flushes += 1;

            if outcome == Ok(FlushOutcome::FullRefreshRequested) {
                renderer.request_full_refresh();
            }
            // Errors are logged by the coordinator; the renderer is always
            // released so the next cycle starts fresh
            renderer.flush_ready();
        }
        drop(renderer);

        let delay = self.config.clamp_delay(requested);
        if flushes > 0 {
            debug!("{} flushes, next run in {} ms", flushes, delay);
        }
        Duration::from_millis(delay as u64)
    }

    /// Run forever
    pub async fn run(&mut self) -> ! {
        info!("render loop started, mode {:?}", self.coordinator.mode());
        loop {
            let delay = self.run_once().await;
            Timer::after(delay).await;
        }
    }
}
