//! Sensorpanel Host Protocol
//!
//! The host streams sensor readings to the panel over a USB CDC-ACM port as
//! newline-terminated ASCII lines:
//! ```text
//! label_cpu_usage: 12%\n
//! bar_cpu_usage: 12\n
//! label_temp_cpu: 45°C\n
//! ```
//!
//! The panel answers with a single byte whenever its backlight changes:
//! `W` (wake) or `S` (sleep).
//!
//! This crate covers line assembly, `name: value` parsing, mapping names to
//! dashboard widgets and decoding values into widget updates. Applying the
//! updates is left to the renderer side.

#![no_std]
#![deny(unsafe_code)]

pub mod decode;
pub mod line;
pub mod link;
pub mod message;
pub mod widgets;

pub use decode::{DecodeError, Decoder, Text, UpdateBatch, WidgetUpdate, MAX_TEXT_LEN};
pub use line::{Line, LineAssembler, LineError, MAX_LINE_LEN};
pub use link::{BacklightSignal, HostLink, LinkUpdate, Screen};
pub use message::{parse_leading_int, MessageError, SensorLine};
pub use widgets::{Container, Palette, WidgetId, WidgetKind, WidgetRole};
