//! Configuration type definitions
//!
//! Boot-time display and render-loop settings. Everything here is fixed once
//! the pipeline is built; `validate()` turns the raw knobs into the one
//! buffering mode the flush coordinator runs in.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Current binary config layout version
pub const CONFIG_VERSION: u8 = 1;

/// Maximum number of frame buffers
pub const MAX_FRAME_BUFFERS: usize = 3;

/// Configuration errors, fatal at init
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Buffer count outside 1..=3
    InvalidBufferCount,
    /// Buffer count, tear protection and refresh style do not form a mode
    UnsupportedBufferMode,
    /// Zero width or height
    InvalidResolution,
    /// Full-copy threshold above 100 %
    InvalidThreshold,
    /// Zero vsync or screen lock timeout
    InvalidTimeout,
    /// Loop delay bounds inverted or zero
    InvalidLoopDelay,
    /// Binary config could not be decoded
    Deserialize,
    /// Binary config could not be encoded
    Serialize,
    /// Binary config layout version mismatch
    VersionMismatch,
}

/// Frame buffer pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PixelFormat {
    #[default]
    Rgb565,
    Rgb888,
}

impl PixelFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb565 => 2,
            PixelFormat::Rgb888 => 3,
        }
    }
}

/// Display rotation, clockwise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Rotation {
    Deg0,
    #[default]
    Deg90,
    Deg180,
    Deg270,
}

/// Axis flags for a touch controller matching the display rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchTransform {
    pub swap_xy: bool,
    pub mirror_x: bool,
    pub mirror_y: bool,
}

impl Rotation {
    pub const fn from_degrees(degrees: u16) -> Option<Self> {
        match degrees {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    pub const fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// 90° and 270° exchange width and height
    pub const fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }

    /// Rotation that undoes this one
    pub const fn inverse(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg0,
            Rotation::Deg90 => Rotation::Deg270,
            Rotation::Deg180 => Rotation::Deg180,
            Rotation::Deg270 => Rotation::Deg90,
        }
    }

    /// Touch axis flags for this orientation
    ///
    /// 180° leaves the touch panel untouched: the controller on the
    /// reference board already reports in that orientation.
    pub const fn touch_transform(self) -> TouchTransform {
        match self {
            Rotation::Deg0 | Rotation::Deg180 => TouchTransform {
                swap_xy: false,
                mirror_x: false,
                mirror_y: false,
            },
            Rotation::Deg90 => TouchTransform {
                swap_xy: true,
                mirror_x: true,
                mirror_y: false,
            },
            Rotation::Deg270 => TouchTransform {
                swap_xy: true,
                mirror_x: false,
                mirror_y: true,
            },
        }
    }
}

/// Buffering strategy, derived once from `DisplayConfig`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferingMode {
    /// One buffer, region draws, no tear protection
    Single,
    /// Two buffers, partial updates mirrored into both
    DoubleDirect,
    /// Two buffers, full-frame copies, waits for vsync
    DoubleFull,
    /// Three buffers, full-frame copies, never waits
    TripleFull,
}

impl BufferingMode {
    pub const fn buffer_count(self) -> usize {
        match self {
            BufferingMode::Single => 1,
            BufferingMode::DoubleDirect | BufferingMode::DoubleFull => 2,
            BufferingMode::TripleFull => 3,
        }
    }

    /// Whether the render task blocks on vsync after presenting
    pub const fn waits_for_vsync(self) -> bool {
        matches!(self, BufferingMode::DoubleDirect | BufferingMode::DoubleFull)
    }
}

/// Display pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisplayConfig {
    /// Physical panel width in pixels
    pub h_res: u16,
    /// Physical panel height in pixels
    pub v_res: u16,
    pub pixel_format: PixelFormat,
    pub rotation: Rotation,
    /// Number of frame buffers (1-3)
    pub buffer_count: u8,
    /// Enable tear protection (requires 2 or 3 buffers)
    pub avoid_tear: bool,
    /// Full-frame copies instead of dirty-region tracking
    pub full_refresh: bool,
    /// Use the scale/rotate/mirror accelerator when present
    pub hw_rotation: bool,
    /// Minimum share of the screen (%) a dirty set must cover to count as full
    pub full_copy_threshold_pct: u8,
    /// Switch to a whole-frame copy after a full refresh gives way to partial ones
    pub large_update_full_copy: bool,
    /// Bound on waiting for a vsync confirmation
    pub vsync_timeout_ms: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            h_res: 480,
            v_res: 800,
            pixel_format: PixelFormat::Rgb565,
            rotation: Rotation::Deg90,
            buffer_count: 2,
            avoid_tear: true,
            full_refresh: false,
            hw_rotation: true,
            full_copy_threshold_pct: 50,
            large_update_full_copy: false,
            vsync_timeout_ms: 100,
        }
    }
}

impl DisplayConfig {
    /// Renderer canvas size; width and height swap at 90°/270°
    pub const fn logical_size(&self) -> (u16, u16) {
        if self.rotation.swaps_axes() {
            (self.v_res, self.h_res)
        } else {
            (self.h_res, self.v_res)
        }
    }

    /// Frame buffer size
    pub const fn physical_size(&self) -> (u16, u16) {
        (self.h_res, self.v_res)
    }

    /// Bytes in one full frame
    pub const fn frame_bytes(&self) -> usize {
        self.h_res as usize * self.v_res as usize * self.pixel_format.bytes_per_pixel()
    }

    /// Check the configuration and derive the buffering mode
    pub fn validate(&self) -> Result<BufferingMode, ConfigError> {
        if self.h_res == 0 || self.v_res == 0 {
            return Err(ConfigError::InvalidResolution);
        }
        if self.full_copy_threshold_pct > 100 {
            return Err(ConfigError::InvalidThreshold);
        }
        if self.vsync_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        match (self.buffer_count, self.avoid_tear, self.full_refresh) {
            (1, false, _) => Ok(BufferingMode::Single),
            (2, true, false) => Ok(BufferingMode::DoubleDirect),
            (2, true, true) => Ok(BufferingMode::DoubleFull),
            (3, true, true) => Ok(BufferingMode::TripleFull),
            (0, _, _) | (4.., _, _) => Err(ConfigError::InvalidBufferCount),
            _ => Err(ConfigError::UnsupportedBufferMode),
        }
    }
}

/// Render loop timing
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RenderLoopConfig {
    /// Lower bound on the sleep between iterations (ms)
    pub min_delay_ms: u32,
    /// Upper bound on the sleep between iterations (ms)
    pub max_delay_ms: u32,
    /// Lock timeout for primary widget updates (ms)
    pub update_lock_timeout_ms: u32,
    /// Lock timeout for follow-up widget updates (ms)
    pub follow_up_lock_timeout_ms: u32,
    /// Lock timeout for host-driven screen changes (ms); retried on the
    /// next host event when it expires
    pub screen_lock_timeout_ms: u32,
}

impl Default for RenderLoopConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 1,
            max_delay_ms: 500,
            update_lock_timeout_ms: 20,
            follow_up_lock_timeout_ms: 10,
            screen_lock_timeout_ms: 100,
        }
    }
}

impl RenderLoopConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_delay_ms == 0 || self.min_delay_ms > self.max_delay_ms {
            return Err(ConfigError::InvalidLoopDelay);
        }
        if self.screen_lock_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }

    /// Clamp a renderer-requested delay into the configured bounds
    pub fn clamp_delay(&self, requested_ms: u32) -> u32 {
        requested_ms.clamp(self.min_delay_ms, self.max_delay_ms)
    }
}

/// Complete panel configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PanelConfig {
    /// Binary layout version
    pub version: u8,
    pub display: DisplayConfig,
    pub render: RenderLoopConfig,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            display: DisplayConfig::default(),
            render: RenderLoopConfig::default(),
        }
    }
}

impl PanelConfig {
    pub fn validate(&self) -> Result<BufferingMode, ConfigError> {
        self.render.validate()?;
        self.display.validate()
    }
}
