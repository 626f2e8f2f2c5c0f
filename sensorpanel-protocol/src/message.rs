//! `name: value` message parsing

/// Errors raised while splitting a line into name and value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageError {
    /// The line has no `:` separator
    MissingSeparator,
    /// The name before `:` is empty
    EmptyName,
}

/// One sensor line, borrowed from the assembled line buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorLine<'a> {
    /// Widget name, e.g. `label_storage_1`
    pub name: &'a str,
    /// Raw value with leading spaces/tabs removed, e.g. `26%`
    pub value: &'a str,
}

impl<'a> SensorLine<'a> {
    /// Split `line` at the first `:`
    pub fn parse(line: &'a str) -> Result<Self, MessageError> {
        let (name, value) = line.split_once(':').ok_or(MessageError::MissingSeparator)?;
        if name.is_empty() {
            return Err(MessageError::EmptyName);
        }
        Ok(Self {
            name,
            value: value.trim_start_matches([' ', '\t']),
        })
    }

    /// Leading integer of the value, if any
    pub fn int_value(&self) -> Option<i32> {
        parse_leading_int(self.value)
    }
}

/// Parse a leading decimal integer the way the host formats numbers
///
/// Accepts optional leading whitespace and sign, stops at the first
/// non-digit: `"26%"` → 26, `" -3"` → -3, `"36°C"` → 36, `"N/A"` → None.
pub fn parse_leading_int(s: &str) -> Option<i32> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut idx = 0;
    let negative = match bytes.first() {
        Some(b'-') => {
            idx = 1;
            true
        }
        Some(b'+') => {
            idx = 1;
            false
        }
        _ => false,
    };

    let start = idx;
    let mut value: i64 = 0;
    while let Some(&b) = bytes.get(idx) {
        if !b.is_ascii_digit() {
            break;
        }
        value = (value * 10 + i64::from(b - b'0')).min(i64::from(i32::MAX) + 1);
        idx += 1;
    }
    if idx == start {
        return None;
    }

    let value = if negative { -value } else { value };
    Some(value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
}
