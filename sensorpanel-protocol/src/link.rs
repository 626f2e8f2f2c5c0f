//! Host link state
//!
//! Tracks the CDC-ACM control lines and decides which screen the panel
//! should show, what the loading screen says, and when the backlight state
//! may be reported to the host.

/// Loading-screen text shown once the host opens the port
pub const TEXT_CONNECTED: &str = "Connected. Waiting for data...";

/// Loading-screen text shown when a streaming host goes away
pub const TEXT_CONNECTION_LOST: &str = "Connection lost. Waiting for reconnect...";

/// Top-level screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Screen {
    Loading,
    Dashboard,
}

/// Single-byte backlight notification sent to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BacklightSignal {
    /// Backlight on; host may stream
    Wake,
    /// Backlight off; host should pause
    Sleep,
}

impl BacklightSignal {
    pub const fn as_byte(self) -> u8 {
        match self {
            BacklightSignal::Wake => b'W',
            BacklightSignal::Sleep => b'S',
        }
    }
}

/// What the UI should do after a link event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkUpdate {
    /// Screen to load
    pub screen: Option<Screen>,
    /// New loading-screen text
    pub loading_text: Option<&'static str>,
}

/// Host link state machine
#[derive(Debug, Clone)]
pub struct HostLink {
    port_open: bool,
    data_received: bool,
    dashboard_requested: bool,
    current: Screen,
    backlight_on: bool,
}

impl Default for HostLink {
    fn default() -> Self {
        Self::new()
    }
}

impl HostLink {
    /// Port closed, loading screen showing, backlight on
    pub const fn new() -> Self {
        Self {
            port_open: false,
            data_received: false,
            dashboard_requested: false,
            current: Screen::Loading,
            backlight_on: true,
        }
    }

    pub fn is_port_open(&self) -> bool {
        self.port_open
    }

    pub fn data_received(&self) -> bool {
        self.data_received
    }

    pub fn screen(&self) -> Screen {
        self.current
    }

    /// DTR line changed
    pub fn on_dtr(&mut self, asserted: bool) -> LinkUpdate {
        match (self.port_open, asserted) {
            (false, true) => {
                self.port_open = true;
                self.dashboard_requested = true;
                LinkUpdate {
                    screen: Some(Screen::Dashboard),
                    loading_text: Some(TEXT_CONNECTED),
                }
            }
            (true, false) => {
                self.port_open = false;
                self.dashboard_requested = false;
                let had_data = core::mem::replace(&mut self.data_received, false);
                LinkUpdate {
                    screen: Some(Screen::Loading),
                    loading_text: had_data.then_some(TEXT_CONNECTION_LOST),
                }
            }
            _ => LinkUpdate::default(),
        }
    }

    /// A chunk of sensor data arrived
    pub fn on_data(&mut self) -> LinkUpdate {
        self.data_received = true;
        if self.dashboard_requested {
            return LinkUpdate::default();
        }
        self.dashboard_requested = true;
        LinkUpdate {
            screen: Some(Screen::Dashboard),
            loading_text: None,
        }
    }

    /// The UI finished loading `screen`
    ///
    /// Showing the dashboard with the port open tells the host to stream.
    pub fn screen_applied(&mut self, screen: Screen) -> Option<BacklightSignal> {
        self.current = screen;
        if screen == Screen::Dashboard && self.port_open && self.backlight_on {
            Some(BacklightSignal::Wake)
        } else {
            None
        }
    }

    /// Backlight switched on or off
    pub fn on_backlight(&mut self, on: bool) -> Option<BacklightSignal> {
        self.backlight_on = on;
        if !self.port_open {
            return None;
        }
        match on {
            true if self.current == Screen::Dashboard => Some(BacklightSignal::Wake),
            true => None,
            false => Some(BacklightSignal::Sleep),
        }
    }
}
