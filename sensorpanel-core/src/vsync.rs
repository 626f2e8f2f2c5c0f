//! Vsync notifier
//!
//! `on_vsync` runs in the display driver's transfer-complete interrupt. It
//! promotes the pending slot to on-screen, releases any slot retired in
//! between and, in blocking modes, wakes the render task. It never blocks
//! or allocates, and does not log.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{with_timeout, Duration};

use crate::config::BufferingMode;
use crate::pool::SlotLedger;

/// What the interrupt does besides bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NotifyMode {
    /// Confirm the slot and wake the render task
    Wake,
    /// Confirm the slot only
    Bookkeeping,
}

/// No vsync confirmation within the bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VsyncTimeout;

/// Bridge between the vsync interrupt and the render task
pub struct VsyncNotifier<'a> {
    ledger: &'a SlotLedger,
    confirmed: Signal<CriticalSectionRawMutex, ()>,
    released: Signal<CriticalSectionRawMutex, ()>,
    mode: NotifyMode,
}

impl<'a> VsyncNotifier<'a> {
    pub const fn new(ledger: &'a SlotLedger, mode: NotifyMode) -> Self {
        Self {
            ledger,
            confirmed: Signal::new(),
            released: Signal::new(),
            mode,
        }
    }

    /// Wake only where the buffering mode blocks on vsync
    pub const fn for_buffering(ledger: &'a SlotLedger, buffering: BufferingMode) -> Self {
        let mode = if buffering.waits_for_vsync() {
            NotifyMode::Wake
        } else {
            NotifyMode::Bookkeeping
        };
        Self::new(ledger, mode)
    }

    pub fn mode(&self) -> NotifyMode {
        self.mode
    }

    pub fn ledger(&self) -> &'a SlotLedger {
        self.ledger
    }

    /// Interrupt entry point
    ///
    /// Returns whether a pending slot was confirmed.
    pub fn on_vsync(&self) -> bool {
        let confirmed = self.ledger.confirm().is_some();
        if confirmed {
            self.released.signal(());
            if self.mode == NotifyMode::Wake {
                self.confirmed.signal(());
            }
        }
        confirmed
    }

    /// Drop any stale wake-up before presenting a new slot
    pub fn arm(&self) {
        self.confirmed.reset();
    }

    /// Wait for the next confirmation
    pub async fn wait(&self) {
        self.confirmed.wait().await
    }

    /// Wait until a confirmation frees a slot
    ///
    /// Signalled in every mode, for callers short of a free slot.
    pub async fn wait_released(&self) {
        self.released.wait().await
    }

    /// Wait for the next confirmation, at most `timeout`
    pub async fn wait_within(&self, timeout: Duration) -> Result<(), VsyncTimeout> {
        with_timeout(timeout, self.wait())
            .await
            .map_err(|_| VsyncTimeout)
    }
}
