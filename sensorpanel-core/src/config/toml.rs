//! Simple TOML parser for panel configuration
//!
//! Handles only the subset the panel needs. It does NOT support the full
//! TOML grammar.
//!
//! Supported:
//! - `key = value` pairs (integer, boolean, quoted or bare string)
//! - `[display]` and `[render]` section headers
//! - Comments (`# ...`), including trailing ones
//!
//! Unknown keys are ignored; unknown sections are an error.

use super::types::{PanelConfig, PixelFormat, Rotation};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Value has the wrong type or is out of range
    InvalidValue,
    /// Line is neither a header nor `key = value`
    InvalidLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Display,
    Render,
}

/// Parse TOML text on top of the default configuration
///
/// The result is not validated; call `PanelConfig::validate` afterwards.
pub fn parse_config(input: &str) -> Result<PanelConfig, ParseError> {
    let mut config = PanelConfig::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = match line[1..line.len() - 1].trim() {
                "display" => Section::Display,
                "render" => Section::Render,
                _ => return Err(ParseError::InvalidSection),
            };
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::InvalidLine)?;
        apply_value(section, key, value, &mut config)?;
    }

    Ok(config)
}

/// Split `key = value`, dropping a trailing comment outside quotes
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let mut value = value.trim();

    if let Some(hash_pos) = value.find('#') {
        if value[..hash_pos].matches('"').count() % 2 == 0 {
            value = value[..hash_pos].trim();
        }
    }

    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

/// Strip surrounding double quotes, if any
fn parse_string(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Decimal integer of any width
fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue)
}

/// `true` or `false`, lowercase only
fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

/// `rgb565` or `rgb888`, quoted or bare, either case
fn parse_pixel_format(value: &str) -> Result<PixelFormat, ParseError> {
    match parse_string(value) {
        "rgb565" | "RGB565" => Ok(PixelFormat::Rgb565),
        "rgb888" | "RGB888" => Ok(PixelFormat::Rgb888),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Rotation in degrees: 0, 90, 180 or 270
fn parse_rotation(value: &str) -> Result<Rotation, ParseError> {
    Rotation::from_degrees(parse_int(value)?).ok_or(ParseError::InvalidValue)
}

/// Store one value into the field `key` names in `section`
fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut PanelConfig,
) -> Result<(), ParseError> {
    match section {
        Section::Root => {
            if key == "version" {
                config.version = parse_int(value)?;
            }
        }
        Section::Display => {
            let d = &mut config.display;
            match key {
                "h_res" | "width" => d.h_res = parse_int(value)?,
                "v_res" | "height" => d.v_res = parse_int(value)?,
                "pixel_format" | "format" => d.pixel_format = parse_pixel_format(value)?,
                "rotation" => d.rotation = parse_rotation(value)?,
                "buffers" | "buffer_count" => d.buffer_count = parse_int(value)?,
                "avoid_tear" => d.avoid_tear = parse_bool(value)?,
                "full_refresh" => d.full_refresh = parse_bool(value)?,
                "hw_rotation" => d.hw_rotation = parse_bool(value)?,
                "full_copy_threshold" => d.full_copy_threshold_pct = parse_int(value)?,
                "large_update_full_copy" => d.large_update_full_copy = parse_bool(value)?,
                "vsync_timeout_ms" => d.vsync_timeout_ms = parse_int(value)?,
                _ => {}
            }
        }
        Section::Render => {
            let r = &mut config.render;
            match key {
                "min_delay_ms" => r.min_delay_ms = parse_int(value)?,
                "max_delay_ms" => r.max_delay_ms = parse_int(value)?,
                "update_lock_timeout_ms" => r.update_lock_timeout_ms = parse_int(value)?,
                "follow_up_lock_timeout_ms" => r.follow_up_lock_timeout_ms = parse_int(value)?,
                "screen_lock_timeout_ms" => r.screen_lock_timeout_ms = parse_int(value)?,
                _ => {}
            }
        }
    }
    Ok(())
}
