//! Sensor line → widget update decoding
//!
//! A decoded line yields an [`UpdateBatch`]: primary updates that target the
//! named widget, and follow-up updates for the widgets that mirror it (the
//! storage arcs and the drive container borders). The two halves are applied
//! under separate renderer-lock acquisitions.

use heapless::{String, Vec};

use crate::message::{MessageError, SensorLine};
use crate::widgets::{Container, Palette, WidgetId, WidgetKind, WidgetRole};

/// Maximum label text length in bytes
pub const MAX_TEXT_LEN: usize = 127;

/// Label text
pub type Text = String<MAX_TEXT_LEN>;

/// Errors raised while decoding a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Line is not `name: value`
    Message(MessageError),
    /// Name not in the widget directory
    UnknownWidget,
    /// Label text empty after sanitising
    EmptyText,
    /// Gauge value has no leading integer
    NotANumber,
}

impl From<MessageError> for DecodeError {
    fn from(e: MessageError) -> Self {
        DecodeError::Message(e)
    }
}

/// A single change to a dashboard object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetUpdate {
    SetText { widget: WidgetId, text: Text },
    SetTextColor { widget: WidgetId, color: Palette },
    /// Gauge value, always within 0..=100
    SetValue { widget: WidgetId, value: u8 },
    SetBorder { container: Container, color: Palette },
}

/// Updates produced by one line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateBatch {
    /// Updates to the named widget
    pub primary: Vec<WidgetUpdate, 2>,
    /// Updates to dependent widgets
    pub follow_up: Vec<WidgetUpdate, 1>,
}

impl UpdateBatch {
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.follow_up.is_empty()
    }

    fn push(&mut self, update: WidgetUpdate) {
        // Each role emits at most two primary updates
        let _ = self.primary.push(update);
    }

    fn follow(&mut self, update: WidgetUpdate) {
        let _ = self.follow_up.push(update);
    }
}

/// Stateful decoder; remembers account and version between lines
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    account: Option<Text>,
    version: Option<Text>,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last account name received
    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    /// Last firmware version received
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Decode one assembled line
    pub fn decode(&mut self, line: &str) -> Result<UpdateBatch, DecodeError> {
        let line = SensorLine::parse(line)?;
        let widget = WidgetId::from_name(line.name).ok_or(DecodeError::UnknownWidget)?;
        let mut batch = UpdateBatch::default();

        match widget.kind() {
            WidgetKind::Bar | WidgetKind::Arc => {
                let value = gauge_value(&line)?;
                batch.push(WidgetUpdate::SetValue { widget, value });
                return Ok(batch);
            }
            WidgetKind::Label => {}
        }

        match widget.role() {
            WidgetRole::Plain => {
                batch.push(WidgetUpdate::SetText {
                    widget,
                    text: sanitize(line.value)?,
                });
            }
            WidgetRole::Temperature => {
                let text = sanitize(line.value)?;
                if let Some(celsius) = line.int_value() {
                    batch.push(WidgetUpdate::SetTextColor {
                        widget,
                        color: Palette::for_temperature(celsius),
                    });
                }
                batch.push(WidgetUpdate::SetText { widget, text });
            }
            WidgetRole::Status => match line.int_value() {
                Some(code) => {
                    let (text, color) = match code {
                        1 => ("Normal", Palette::Normal),
                        2 => ("Failed", Palette::Error),
                        _ => ("Unknown", Palette::Normal),
                    };
                    batch.push(WidgetUpdate::SetText {
                        widget,
                        text: sanitize(text)?,
                    });
                    batch.push(WidgetUpdate::SetTextColor { widget, color });
                }
                None => batch.push(WidgetUpdate::SetText {
                    widget,
                    text: sanitize(line.value)?,
                }),
            },
            WidgetRole::Upgrade => {
                let (text, color) = match line.int_value() {
                    Some(1) => ("Available", Palette::Normal),
                    Some(2) => ("Unavailable", Palette::Error),
                    Some(3) => ("Connecting", Palette::Normal),
                    Some(4) => ("Disconnected", Palette::Error),
                    Some(5) => ("Others", Palette::Normal),
                    _ => ("Unknown", Palette::Normal),
                };
                batch.push(WidgetUpdate::SetText {
                    widget,
                    text: sanitize(text)?,
                });
                batch.push(WidgetUpdate::SetTextColor { widget, color });
            }
            WidgetRole::Storage(slot) => {
                batch.push(WidgetUpdate::SetText {
                    widget,
                    text: sanitize(line.value)?,
                });
                if let (Some(arc), Ok(value)) = (WidgetId::storage_arc(slot), gauge_value(&line)) {
                    batch.follow(WidgetUpdate::SetValue { widget: arc, value });
                }
            }
            WidgetRole::Account => {
                self.account = Some(sanitize(line.value)?);
                batch.push(self.account_text_update()?);
            }
            WidgetRole::Version => {
                self.version = Some(sanitize(line.value)?);
                if self.account.is_some() {
                    batch.push(self.account_text_update()?);
                }
            }
            WidgetRole::DriveStatus(container) => {
                if let Some(container) = container {
                    let color = match line.int_value() {
                        Some(1) => Palette::Normal,
                        _ => Palette::Error,
                    };
                    batch.follow(WidgetUpdate::SetBorder { container, color });
                }
            }
        }

        Ok(batch)
    }

    fn account_text_update(&self) -> Result<WidgetUpdate, DecodeError> {
        let account = self.account.as_deref().unwrap_or("");
        let mut text = Text::new();
        push_truncated(&mut text, account);
        if let Some(version) = self.version.as_deref() {
            push_truncated(&mut text, " - ");
            push_truncated(&mut text, version);
        }
        if text.is_empty() {
            return Err(DecodeError::EmptyText);
        }
        Ok(WidgetUpdate::SetText {
            widget: WidgetId::account(),
            text,
        })
    }
}

fn gauge_value(line: &SensorLine<'_>) -> Result<u8, DecodeError> {
    line.int_value()
        .map(|v| v.clamp(0, 100) as u8)
        .ok_or(DecodeError::NotANumber)
}

/// Cut text at the first control character other than tab/newline/CR and
/// cap it at `MAX_TEXT_LEN` bytes on a char boundary
pub fn sanitize(value: &str) -> Result<Text, DecodeError> {
    let end = value
        .char_indices()
        .find(|&(_, c)| c.is_control() && !matches!(c, '\t' | '\n' | '\r'))
        .map_or(value.len(), |(idx, _)| idx);

    let mut text = Text::new();
    push_truncated(&mut text, &value[..end]);
    if text.is_empty() {
        return Err(DecodeError::EmptyText);
    }
    Ok(text)
}

fn push_truncated(text: &mut Text, s: &str) {
    for c in s.chars() {
        if text.push(c).is_err() {
            break;
        }
    }
}
