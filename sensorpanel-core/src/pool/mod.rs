//! Frame buffer pool
//!
//! Owns the 1-3 physical frame buffers for the lifetime of the firmware.
//! Buffers never move; only their roles do. Which slot is on screen and
//! which is in flight lives in the shared [`SlotLedger`].

pub mod ledger;

use embassy_time::{with_timeout, Duration, Instant};
use heapless::Vec;

use crate::config::{PixelFormat, MAX_FRAME_BUFFERS};
use crate::traits::{DisplayDriver, DriverError};
use crate::vsync::VsyncNotifier;

pub use ledger::{LedgerSnapshot, SlotLedger};

/// Frame buffer slot index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotId(u8);

impl SlotId {
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn raw(self) -> u8 {
        self.0
    }
}

/// Current role of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotRole {
    /// Being scanned out by the panel
    OnScreen,
    /// Being filled for the next frame
    RenderTarget,
    /// Handed to the driver, awaiting vsync
    Pending,
    /// Free
    Spare,
}

/// Pool construction errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PoolError {
    /// Zero or more than `MAX_FRAME_BUFFERS` buffers
    InvalidBufferCount,
    /// A buffer is smaller than one frame
    BufferTooSmall,
}

/// Fixed set of frame buffers
pub struct FrameBufferPool<'a, B> {
    slots: Vec<B, MAX_FRAME_BUFFERS>,
    ledger: &'a SlotLedger,
    target: Option<SlotId>,
    width: u16,
    height: u16,
    format: PixelFormat,
}

impl<'a, B> FrameBufferPool<'a, B>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    /// Build a pool of `width × height` frames over the given buffers
    ///
    /// Slot 0 starts on screen.
    pub fn new<I>(
        buffers: I,
        ledger: &'a SlotLedger,
        width: u16,
        height: u16,
        format: PixelFormat,
    ) -> Result<Self, PoolError>
    where
        I: IntoIterator<Item = B>,
    {
        let mut slots = Vec::new();
        for buffer in buffers {
            slots
                .push(buffer)
                .map_err(|_| PoolError::InvalidBufferCount)?;
        }
        if slots.is_empty() {
            return Err(PoolError::InvalidBufferCount);
        }

        let frame_bytes = width as usize * height as usize * format.bytes_per_pixel();
        if slots.iter().any(|s| s.as_ref().len() < frame_bytes) {
            return Err(PoolError::BufferTooSmall);
        }

        ledger.reset(SlotId::new(0));
        Ok(Self {
            slots,
            ledger,
            target: None,
            width,
            height,
            format,
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn ledger(&self) -> &'a SlotLedger {
        self.ledger
    }

    /// Bytes in one frame
    pub fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }

    /// Pick the slot to render the next frame into
    ///
    /// With one buffer this is always the on-screen slot. Otherwise it is a
    /// slot that is neither on screen nor in flight; `None` means the caller
    /// outpaced vsync confirmations.
    pub fn acquire_next_target(&mut self) -> Option<SlotId> {
        if self.slots.len() == 1 {
            let slot = SlotId::new(0);
            self.target = Some(slot);
            return Some(slot);
        }

        let snap = self.ledger.snapshot();
        let slot = (0..self.slots.len() as u8)
            .map(SlotId::new)
            .find(|&slot| !snap.is_busy(slot))?;
        self.target = Some(slot);
        Some(slot)
    }

    /// Like `acquire_next_target`, waiting up to `timeout` for vsync
    /// confirmations to free a slot
    pub async fn acquire_next_target_within(
        &mut self,
        vsync: &VsyncNotifier<'_>,
        timeout: Duration,
    ) -> Option<SlotId> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(slot) = self.acquire_next_target() {
                return Some(slot);
            }
            let remaining = deadline.checked_duration_since(Instant::now())?;
            with_timeout(remaining, vsync.wait_released()).await.ok()?;
        }
    }

    /// Hand `slot` to the driver and mark it in flight
    ///
    /// The slot is published before the driver call so a fast vsync cannot
    /// be missed; a refused buffer is withdrawn again.
    pub fn present<D: DisplayDriver>(
        &mut self,
        slot: SlotId,
        driver: &mut D,
    ) -> Result<(), DriverError> {
        let pixels = self
            .slots
            .get(slot.index())
            .ok_or(DriverError::InvalidSlot)?
            .as_ref();

        if let Some(superseded) = self.ledger.publish_pending(slot) {
            crate::log::debug!("slot {} superseded before vsync", superseded.index());
        }
        if self.target == Some(slot) {
            self.target = None;
        }

        driver.switch_active_buffer(slot, pixels).map_err(|e| {
            self.ledger.retract(slot);
            e
        })
    }

    /// Role of `slot` right now
    pub fn role(&self, slot: SlotId) -> SlotRole {
        let snap = self.ledger.snapshot();
        if snap.on_screen == slot {
            SlotRole::OnScreen
        } else if snap.pending == Some(slot) || snap.retiring == Some(slot) {
            SlotRole::Pending
        } else if self.target == Some(slot) {
            SlotRole::RenderTarget
        } else {
            SlotRole::Spare
        }
    }

    pub fn slot(&self, slot: SlotId) -> Option<&[u8]> {
        self.slots.get(slot.index()).map(|b| b.as_ref())
    }

    pub fn slot_mut(&mut self, slot: SlotId) -> Option<&mut [u8]> {
        self.slots.get_mut(slot.index()).map(|b| b.as_mut())
    }

    /// Idle slots other than `exclude`
    ///
    /// Slots the panel is or may still be reading are left alone.
    pub fn others(&self, exclude: SlotId) -> impl Iterator<Item = SlotId> + '_ {
        let snap = self.ledger.snapshot();
        (0..self.slots.len() as u8)
            .map(SlotId::new)
            .filter(move |&slot| slot != exclude && !snap.is_busy(slot))
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::testutil::RecordingDriver;
    use std::vec;
    use std::vec::Vec as StdVec;

    fn buffers(count: usize) -> StdVec<StdVec<u8>> {
        (0..count).map(|_| vec![0u8; 4 * 4 * 2]).collect()
    }

    #[test]
    fn test_rejects_bad_buffers() {
        let ledger = SlotLedger::new();
        let none: StdVec<StdVec<u8>> = StdVec::new();
        assert_eq!(
            FrameBufferPool::new(none, &ledger, 4, 4, PixelFormat::Rgb565).err(),
            Some(PoolError::InvalidBufferCount)
        );
        assert_eq!(
            FrameBufferPool::new(buffers(4), &ledger, 4, 4, PixelFormat::Rgb565).err(),
            Some(PoolError::InvalidBufferCount)
        );
        assert_eq!(
            FrameBufferPool::new(buffers(2), &ledger, 4, 4, PixelFormat::Rgb888).err(),
            Some(PoolError::BufferTooSmall)
        );
    }

    #[test]
    fn test_double_buffer_alternates() {
        let ledger = SlotLedger::new();
        let mut pool = FrameBufferPool::new(buffers(2), &ledger, 4, 4, PixelFormat::Rgb565).unwrap();
        let mut driver = RecordingDriver::default();

        let mut seen = StdVec::new();
        for _ in 0..4 {
            let slot = pool.acquire_next_target().unwrap();
            assert_eq!(pool.role(slot), SlotRole::RenderTarget);
            pool.present(slot, &mut driver).unwrap();
            assert_eq!(pool.role(slot), SlotRole::Pending);
            ledger.confirm();
            assert_eq!(pool.role(slot), SlotRole::OnScreen);
            seen.push(slot.index());
        }
        assert_eq!(seen, [1usize, 0, 1, 0]);
        assert_eq!(driver.switched.len(), 4);
    }

    #[test]
    fn test_in_flight_slot_never_handed_out() {
        let ledger = SlotLedger::new();
        let mut pool = FrameBufferPool::new(buffers(2), &ledger, 4, 4, PixelFormat::Rgb565).unwrap();
        let mut driver = RecordingDriver::default();

        let slot = pool.acquire_next_target().unwrap();
        pool.present(slot, &mut driver).unwrap();
        // Slot 0 on screen, slot 1 in flight
        assert_eq!(pool.acquire_next_target(), None);

        ledger.confirm();
        assert_eq!(pool.acquire_next_target(), Some(SlotId::new(0)));
    }

    #[test]
    fn test_triple_buffer_skips_pending() {
        let ledger = SlotLedger::new();
        let mut pool = FrameBufferPool::new(buffers(3), &ledger, 4, 4, PixelFormat::Rgb565).unwrap();
        let mut driver = RecordingDriver::default();

        let first = pool.acquire_next_target().unwrap();
        pool.present(first, &mut driver).unwrap();
        let second = pool.acquire_next_target().unwrap();
        assert_ne!(second, first);
        assert_ne!(second, ledger.on_screen());
        assert_eq!(pool.role(SlotId::new(0)), SlotRole::OnScreen);
        assert_eq!(pool.role(first), SlotRole::Pending);
    }

    #[test]
    fn test_single_buffer_targets_on_screen() {
        let ledger = SlotLedger::new();
        let mut pool = FrameBufferPool::new(buffers(1), &ledger, 4, 4, PixelFormat::Rgb565).unwrap();
        assert_eq!(pool.acquire_next_target(), Some(SlotId::new(0)));
        assert_eq!(pool.acquire_next_target(), Some(SlotId::new(0)));
    }

    #[test]
    fn test_refused_present_is_withdrawn() {
        let ledger = SlotLedger::new();
        let mut pool = FrameBufferPool::new(buffers(2), &ledger, 4, 4, PixelFormat::Rgb565).unwrap();
        let mut driver = RecordingDriver {
            fail_switch: true,
            ..Default::default()
        };

        let slot = pool.acquire_next_target().unwrap();
        assert_eq!(pool.present(slot, &mut driver), Err(DriverError::Unreachable));
        assert_eq!(ledger.pending(), None);
        assert_eq!(pool.acquire_next_target(), Some(slot));
    }

    #[test]
    fn test_acquire_within_waits_for_vsync() {
        use crate::config::BufferingMode;
        use embassy_futures::block_on;

        let ledger = SlotLedger::new();
        let notifier = VsyncNotifier::for_buffering(&ledger, BufferingMode::DoubleDirect);
        let mut pool = FrameBufferPool::new(buffers(2), &ledger, 4, 4, PixelFormat::Rgb565).unwrap();
        let mut driver = RecordingDriver::default();

        let slot = pool.acquire_next_target().unwrap();
        pool.present(slot, &mut driver).unwrap();
        assert_eq!(pool.acquire_next_target(), None);

        let started = std::time::Instant::now();
        let acquired = std::thread::scope(|s| {
            s.spawn(|| {
                std::thread::sleep(std::time::Duration::from_millis(20));
                notifier.on_vsync();
            });
            block_on(pool.acquire_next_target_within(&notifier, Duration::from_millis(500)))
        });
        assert_eq!(acquired, Some(SlotId::new(0)));
        assert!(started.elapsed() >= std::time::Duration::from_millis(15));
        assert_eq!(ledger.on_screen(), SlotId::new(1));
    }

    #[test]
    fn test_acquire_within_gives_up_without_vsync() {
        use crate::config::BufferingMode;
        use embassy_futures::block_on;

        let ledger = SlotLedger::new();
        let notifier = VsyncNotifier::for_buffering(&ledger, BufferingMode::TripleFull);
        let mut pool = FrameBufferPool::new(buffers(2), &ledger, 4, 4, PixelFormat::Rgb565).unwrap();
        let mut driver = RecordingDriver::default();

        let slot = pool.acquire_next_target().unwrap();
        pool.present(slot, &mut driver).unwrap();
        assert_eq!(
            block_on(pool.acquire_next_target_within(&notifier, Duration::from_millis(5))),
            None
        );
    }

    #[test]
    fn test_superseded_slot_is_not_reused_before_vsync() {
        let ledger = SlotLedger::new();
        let mut pool = FrameBufferPool::new(buffers(3), &ledger, 4, 4, PixelFormat::Rgb565).unwrap();
        let mut driver = RecordingDriver::default();

        let first = pool.acquire_next_target().unwrap();
        pool.present(first, &mut driver).unwrap();
        let second = pool.acquire_next_target().unwrap();
        pool.present(second, &mut driver).unwrap();

        assert_eq!(pool.role(first), SlotRole::Pending);
        assert_eq!(pool.acquire_next_target(), None);
        assert_eq!(pool.others(second).count(), 0);

        ledger.confirm();
        assert_eq!(pool.acquire_next_target(), Some(first));
    }

    #[test]
    fn test_present_unknown_slot() {
        let ledger = SlotLedger::new();
        let mut pool = FrameBufferPool::new(buffers(2), &ledger, 4, 4, PixelFormat::Rgb565).unwrap();
        let mut driver = RecordingDriver::default();
        assert_eq!(
            pool.present(SlotId::new(3), &mut driver),
            Err(DriverError::InvalidSlot)
        );
        assert_eq!(ledger.pending(), None);
    }
}
