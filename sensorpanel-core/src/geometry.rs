//! Screen-space rectangles

/// Inclusive pixel rectangle `(x1, y1)..=(x2, y2)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Area {
    pub x1: u16,
    pub y1: u16,
    pub x2: u16,
    pub y2: u16,
}

impl Area {
    pub const fn new(x1: u16, y1: u16, x2: u16, y2: u16) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// The whole `width × height` canvas
    pub const fn full(width: u16, height: u16) -> Self {
        Self {
            x1: 0,
            y1: 0,
            x2: width.saturating_sub(1),
            y2: height.saturating_sub(1),
        }
    }

    /// Width in pixels; zero for an invalid area
    pub const fn width(&self) -> u32 {
        (self.x2 as u32 + 1).saturating_sub(self.x1 as u32)
    }

    pub const fn height(&self) -> u32 {
        (self.y2 as u32 + 1).saturating_sub(self.y1 as u32)
    }

    pub const fn pixel_count(&self) -> u32 {
        self.width() * self.height()
    }

    /// Corners are ordered (`x1 <= x2`, `y1 <= y2`)
    pub const fn is_valid(&self) -> bool {
        self.x1 <= self.x2 && self.y1 <= self.y2
    }

    /// Lies entirely inside a `width × height` canvas
    pub const fn fits_within(&self, width: u16, height: u16) -> bool {
        self.is_valid() && (self.x2 as u32) < width as u32 && (self.y2 as u32) < height as u32
    }

    /// Bounding box of both rectangles
    pub fn union(&self, other: &Area) -> Area {
        Area {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }

    pub const fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x1 && x <= self.x2 && y >= self.y1 && y <= self.y2
    }
}
