//! Dashboard widget directory
//!
//! Maps the names the host sends to the widgets on the dashboard screen.
//! The renderer side resolves a `WidgetId` to its own object handle.

/// Widget kind, which decides how a value is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WidgetKind {
    /// Text label
    Label,
    /// Horizontal bar, 0-100
    Bar,
    /// Arc gauge, 0-100
    Arc,
}

/// How the decoder treats a name beyond the plain kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WidgetRole {
    /// Value applied as-is
    Plain,
    /// Temperature label, coloured by value
    Temperature,
    /// Health status code (1 = Normal, 2 = Failed)
    Status,
    /// Upgrade availability code (1-5)
    Upgrade,
    /// Storage usage label; also drives the matching arc (1-4)
    Storage(u8),
    /// Account label, joined with the last known version
    Account,
    /// Firmware version; has no widget of its own
    Version,
    /// Drive health code; colours a container border, has no widget
    DriveStatus(Option<Container>),
}

/// Bordered container around a drive temperature readout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Container {
    /// SATA drive bay 1-5
    Drive(u8),
    /// NVMe slot 1-5
    Nvme(u8),
}

/// Colours the dashboard uses for state feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Palette {
    /// Default accent (blue)
    Normal,
    /// Warning (orange)
    Warning,
    /// Error (red)
    Error,
}

impl Palette {
    /// 24-bit RGB value
    pub const fn rgb(self) -> u32 {
        match self {
            Palette::Normal => 0x2195F6,
            Palette::Warning => 0xFFA500,
            Palette::Error => 0xFF0000,
        }
    }

    /// Colour for a temperature reading in °C
    pub const fn for_temperature(celsius: i32) -> Self {
        if celsius < 40 {
            Palette::Normal
        } else if celsius < 50 {
            Palette::Warning
        } else {
            Palette::Error
        }
    }
}

/// Index into the widget directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WidgetId(u8);

struct Entry {
    name: &'static str,
    kind: WidgetKind,
    role: WidgetRole,
}

const fn label(name: &'static str, role: WidgetRole) -> Entry {
    Entry {
        name,
        kind: WidgetKind::Label,
        role,
    }
}

const fn gauge(name: &'static str, kind: WidgetKind) -> Entry {
    Entry {
        name,
        kind,
        role: WidgetRole::Plain,
    }
}

use WidgetRole::*;

const DIRECTORY: &[Entry] = &[
    // Storage
    label("label_storage_1", Storage(1)),
    label("label_storage_total_1", Plain),
    label("label_storage_2", Storage(2)),
    label("label_storage_total_2", Plain),
    label("label_storage_3", Storage(3)),
    label("label_storage_total_3", Plain),
    label("label_storage_4", Storage(4)),
    label("label_storage_total_4", Plain),
    gauge("arc_storage_1", WidgetKind::Arc),
    gauge("arc_storage_2", WidgetKind::Arc),
    gauge("arc_storage_3", WidgetKind::Arc),
    gauge("arc_storage_4", WidgetKind::Arc),
    // Fans
    label("label_fan2_value", Plain),
    label("label_fan3_value", Plain),
    // CPU / RAM / GPU
    label("label_cpu_usage", Plain),
    label("label_cpu_usage_per", Plain),
    gauge("bar_cpu_usage", WidgetKind::Bar),
    label("label_ram_usage", Plain),
    label("label_ram_usage_per", Plain),
    gauge("bar_ram_usage", WidgetKind::Bar),
    label("label_gpu_usage", Plain),
    label("label_gpu_usage_per", Plain),
    label("label_gpu_fan_speed", Plain),
    gauge("bar_gpu_usage", WidgetKind::Bar),
    // Temperatures
    label("label_temp_drive1", Temperature),
    label("label_temp_drive2", Temperature),
    label("label_temp_drive3", Temperature),
    label("label_temp_drive4", Temperature),
    label("label_temp_drive5", Temperature),
    label("label_temp_nvme1", Temperature),
    label("label_temp_nvme2", Temperature),
    label("label_temp_nvme3", Temperature),
    label("label_temp_nvme4", Temperature),
    label("label_temp_nvme5", Temperature),
    label("label_temp_motherboard", Temperature),
    label("label_temp_chipset", Temperature),
    label("label_temp_cpu", Temperature),
    label("label_temp_gpu", Temperature),
    label("label_temp_ram", Temperature),
    // System info
    label("label_hostname", Plain),
    label("label_account", Account),
    label("label_version", Version),
    // System status
    label("label_system_status", Status),
    label("label_thermal_status", Status),
    label("label_upgrade_available", Upgrade),
    label("label_power_status", Status),
    label("label_system_fan_status", Status),
    // Network
    label("label_download_total", Plain),
    label("label_upload_total", Plain),
    label("label_ping_total", Plain),
    // Disk I/O
    label("label_disk_iops", Plain),
    label("label_disk_read", Plain),
    label("label_disk_write", Plain),
    // Drive health
    label("label_status_drive0", DriveStatus(None)),
    label("label_status_drive1", DriveStatus(Some(Container::Drive(1)))),
    label("label_status_drive2", DriveStatus(Some(Container::Drive(2)))),
    label("label_status_drive3", DriveStatus(Some(Container::Drive(3)))),
    label("label_status_drive4", DriveStatus(Some(Container::Drive(4)))),
    label("label_status_drive5", DriveStatus(Some(Container::Drive(5)))),
    label("label_status_nvme1", DriveStatus(Some(Container::Nvme(1)))),
    label("label_status_nvme2", DriveStatus(Some(Container::Nvme(2)))),
    label("label_status_nvme3", DriveStatus(Some(Container::Nvme(3)))),
    label("label_status_nvme4", DriveStatus(Some(Container::Nvme(4)))),
    label("label_status_nvme5", DriveStatus(Some(Container::Nvme(5)))),
];

impl WidgetId {
    /// Look up a widget by the name the host sends
    pub fn from_name(name: &str) -> Option<Self> {
        DIRECTORY
            .iter()
            .position(|entry| entry.name == name)
            .map(|idx| WidgetId(idx as u8))
    }

    /// Number of names in the directory
    pub const fn count() -> usize {
        DIRECTORY.len()
    }

    /// Iterate over every known widget
    pub fn all() -> impl Iterator<Item = WidgetId> {
        (0..DIRECTORY.len()).map(|idx| WidgetId(idx as u8))
    }

    /// Directory index, stable for the lifetime of the firmware
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub fn name(self) -> &'static str {
        DIRECTORY[self.index()].name
    }

    pub fn kind(self) -> WidgetKind {
        DIRECTORY[self.index()].kind
    }

    pub fn role(self) -> WidgetRole {
        DIRECTORY[self.index()].role
    }

    /// Whether a dashboard object backs this name
    ///
    /// Version and drive-health names only feed other widgets.
    pub fn has_object(self) -> bool {
        !matches!(self.role(), WidgetRole::Version | WidgetRole::DriveStatus(_))
    }

    /// Arc gauge paired with a storage label
    pub fn storage_arc(slot: u8) -> Option<Self> {
        match slot {
            1 => Self::from_name("arc_storage_1"),
            2 => Self::from_name("arc_storage_2"),
            3 => Self::from_name("arc_storage_3"),
            4 => Self::from_name("arc_storage_4"),
            _ => None,
        }
    }

    /// The account label
    pub fn account() -> Self {
        // Present in the directory above
        Self::from_name("label_account").unwrap_or(WidgetId(0))
    }
}
