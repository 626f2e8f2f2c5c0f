//! Dirty-region tracking
//!
//! Holds the rectangles invalidated in the current refresh cycle and decides
//! whether the cycle counts as a full-screen update.

use heapless::Vec;

use crate::geometry::Area;
use crate::traits::InvalidArea;

/// Rectangles kept per cycle before collapsing to the full screen
pub const MAX_DIRTY_AREAS: usize = 32;

/// Rectangle list for one cycle
pub type DirtyAreas = Vec<InvalidArea, MAX_DIRTY_AREAS>;

/// Cycle classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RefreshKind {
    Partial,
    Full,
}

/// Copy strategy picked for a DoubleDirect cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CopyProbe {
    /// Copy the dirty rectangles
    PartCopy,
    /// Consecutive full cycles; the rectangles already cover everything
    SkipCopy,
    /// Full cycle gave way to a partial one; refresh the whole frame
    FullCopy,
}

/// Per-cycle dirty rectangle set
#[derive(Debug, Clone)]
pub struct DirtyTracker {
    areas: DirtyAreas,
    total: u32,
    width: u16,
    height: u16,
    threshold_pct: u8,
    previous: RefreshKind,
    full_copy_policy: bool,
}

impl DirtyTracker {
    /// Tracker for a `width × height` logical screen
    ///
    /// `threshold_pct` is the share of the screen a cycle must cover to be
    /// `Full`. With `full_copy_policy` off `probe` always answers `PartCopy`.
    pub fn new(width: u16, height: u16, threshold_pct: u8, full_copy_policy: bool) -> Self {
        Self {
            areas: Vec::new(),
            total: 0,
            width,
            height,
            threshold_pct: threshold_pct.min(100),
            previous: RefreshKind::Partial,
            full_copy_policy,
        }
    }

    /// Replace the tracked set with this cycle's rectangles
    ///
    /// Rectangles are clipped to the screen. More than `MAX_DIRTY_AREAS`
    /// collapse to a single full-screen rectangle.
    pub fn record(&mut self, rects: &[InvalidArea]) {
        self.areas.clear();
        let screen = Area::full(self.width, self.height);

        let mut overflow = false;
        for rect in rects {
            let Some(area) = clip(rect.area, screen) else {
                continue;
            };
            if self.areas.push(InvalidArea { area, joined: rect.joined }).is_err() {
                overflow = true;
                break;
            }
        }
        if overflow {
            crate::log::debug!("{} dirty areas, tracking full screen", rects.len());
            self.areas.clear();
            // Capacity is non-zero
            let _ = self.areas.push(InvalidArea::new(screen));
        }

        self.total = self
            .areas
            .iter()
            .filter(|a| !a.joined)
            .map(|a| a.area.pixel_count())
            .sum();
    }

    /// Forget the current set
    pub fn clear(&mut self) {
        self.areas.clear();
        self.total = 0;
    }

    /// Area of unjoined rectangles in pixels
    pub fn total_area(&self) -> u32 {
        self.total
    }

    /// Unjoined rectangles of the current cycle
    pub fn dirty_areas(&self) -> impl Iterator<Item = Area> + '_ {
        self.areas.iter().filter(|a| !a.joined).map(|a| a.area)
    }

    pub fn is_empty(&self) -> bool {
        self.dirty_areas().next().is_none()
    }

    /// Bounding box of the unjoined rectangles
    pub fn bounding_box(&self) -> Option<Area> {
        self.dirty_areas().reduce(|acc, a| acc.union(&a))
    }

    /// Full only when the rectangles span the whole screen and cover more
    /// than the threshold share of it
    pub fn classify(&self) -> RefreshKind {
        let screen = Area::full(self.width, self.height);
        let spans_screen = self.bounding_box() == Some(screen);
        let covered = self.total as u64 * 100 > screen.pixel_count() as u64 * self.threshold_pct as u64;
        if spans_screen && covered {
            RefreshKind::Full
        } else {
            RefreshKind::Partial
        }
    }

    /// Classify the cycle, pick a copy strategy and remember the result
    pub fn probe(&mut self) -> CopyProbe {
        let current = self.classify();
        let previous = core::mem::replace(&mut self.previous, current);
        if !self.full_copy_policy {
            return CopyProbe::PartCopy;
        }
        match (previous, current) {
            (RefreshKind::Full, RefreshKind::Full) => CopyProbe::SkipCopy,
            (RefreshKind::Full, RefreshKind::Partial) => CopyProbe::FullCopy,
            _ => CopyProbe::PartCopy,
        }
    }

    /// Classification of the last probed cycle
    pub fn previous(&self) -> RefreshKind {
        self.previous
    }

    /// Copy of the current rectangles
    pub fn snapshot(&self) -> DirtyAreas {
        self.areas.clone()
    }
}

fn clip(area: Area, screen: Area) -> Option<Area> {
    if !area.is_valid() || area.x1 > screen.x2 || area.y1 > screen.y2 {
        return None;
    }
    Some(Area::new(
        area.x1,
        area.y1,
        area.x2.min(screen.x2),
        area.y2.min(screen.y2),
    ))
}
