//! Slot ownership word shared with the vsync interrupt
//!
//! Layout of the single atomic byte:
//! ```text
//!  bit   7         6..5       4        3..2      1..0
//!       ┌─────────┬──────────┬───────┬─────────┬───────────┐
//!       │ VALID   │ RETIRING │ VALID │ PENDING │ ON_SCREEN │
//!       └─────────┴──────────┴───────┴─────────┴───────────┘
//! ```
//! The render task publishes a pending slot; the interrupt promotes it to
//! on-screen in one compare-and-swap. A pending slot superseded before its
//! vsync moves to RETIRING: the panel may still be reading it, so it stays
//! busy until the next confirmation.

use portable_atomic::{AtomicU8, Ordering};

use super::SlotId;

const ON_SCREEN_MASK: u8 = 0b0000_0011;
const PENDING_SHIFT: u8 = 2;
const PENDING_MASK: u8 = 0b0000_1100;
const PENDING_VALID: u8 = 0b0001_0000;
const RETIRING_SHIFT: u8 = 5;
const RETIRING_MASK: u8 = 0b0110_0000;
const RETIRING_VALID: u8 = 0b1000_0000;

/// Point-in-time view of the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedgerSnapshot {
    /// Slot the panel is scanning out
    pub on_screen: SlotId,
    /// Slot handed to the driver, not yet confirmed
    pub pending: Option<SlotId>,
    /// Slot superseded before its vsync
    pub retiring: Option<SlotId>,
}

impl LedgerSnapshot {
    fn decode(word: u8) -> Self {
        let pending = (word & PENDING_VALID != 0)
            .then(|| SlotId::new((word & PENDING_MASK) >> PENDING_SHIFT));
        let retiring = (word & RETIRING_VALID != 0)
            .then(|| SlotId::new((word & RETIRING_MASK) >> RETIRING_SHIFT));
        Self {
            on_screen: SlotId::new(word & ON_SCREEN_MASK),
            pending,
            retiring,
        }
    }

    /// Slot is on screen, in flight or possibly still being scanned out
    pub fn is_busy(&self, slot: SlotId) -> bool {
        self.on_screen == slot || self.pending == Some(slot) || self.retiring == Some(slot)
    }
}

const fn pending_bits(slot: SlotId) -> u8 {
    PENDING_VALID | ((slot.raw() << PENDING_SHIFT) & PENDING_MASK)
}

const fn retiring_bits(slot: SlotId) -> u8 {
    RETIRING_VALID | ((slot.raw() << RETIRING_SHIFT) & RETIRING_MASK)
}

/// Atomic slot ownership word
#[derive(Debug)]
pub struct SlotLedger {
    word: AtomicU8,
}

impl Default for SlotLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotLedger {
    /// Slot 0 on screen, nothing pending
    pub const fn new() -> Self {
        Self {
            word: AtomicU8::new(0),
        }
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot::decode(self.word.load(Ordering::Acquire))
    }

    pub fn on_screen(&self) -> SlotId {
        self.snapshot().on_screen
    }

    pub fn pending(&self) -> Option<SlotId> {
        self.snapshot().pending
    }

    pub fn retiring(&self) -> Option<SlotId> {
        self.snapshot().retiring
    }

    /// Mark `slot` as handed to the driver
    ///
    /// Returns the previously pending slot if it was never confirmed; that
    /// slot stays busy as RETIRING until the next vsync.
    pub fn publish_pending(&self, slot: SlotId) -> Option<SlotId> {
        let previous = self
            .word
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                let snap = LedgerSnapshot::decode(word);
                let retiring = match snap.pending {
                    Some(superseded) => retiring_bits(superseded),
                    None => word & (RETIRING_VALID | RETIRING_MASK),
                };
                Some((word & ON_SCREEN_MASK) | pending_bits(slot) | retiring)
            })
            .unwrap_or_else(|word| word);
        LedgerSnapshot::decode(previous).pending
    }

    /// Withdraw `slot` if it is still pending
    ///
    /// Used when the driver refuses a buffer after it was published. A
    /// slot it superseded becomes pending again.
    pub fn retract(&self, slot: SlotId) -> bool {
        self.word
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                let snap = LedgerSnapshot::decode(word);
                (snap.pending == Some(slot)).then(|| {
                    (word & ON_SCREEN_MASK) | snap.retiring.map_or(0, pending_bits)
                })
            })
            .is_ok()
    }

    /// Promote the pending slot to on-screen and release the retiring one
    ///
    /// Interrupt-safe. Returns the newly confirmed slot, or `None` when
    /// nothing was pending.
    pub fn confirm(&self) -> Option<SlotId> {
        self.word
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                (word & PENDING_VALID != 0).then_some((word & PENDING_MASK) >> PENDING_SHIFT)
            })
            .ok()
            .and_then(|previous| LedgerSnapshot::decode(previous).pending)
    }

    /// Force a known state, e.g. after panel re-init
    pub fn reset(&self, on_screen: SlotId) {
        self.word.store(on_screen.raw() & ON_SCREEN_MASK, Ordering::Release);
    }
}
