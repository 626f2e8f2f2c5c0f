//! Line assembly for the host sensor stream.
//!
//! The host writes newline-terminated ASCII lines over a CDC-ACM port:
//! - `\n` terminates a line
//! - `\r` and `\0` are dropped wherever they appear
//! - empty lines are ignored
//! - lines longer than `MAX_LINE_LEN` bytes are discarded whole

use heapless::{String, Vec};

/// Maximum accepted line length in bytes (excluding the terminator)
pub const MAX_LINE_LEN: usize = 127;

/// Errors raised while assembling lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    /// Line exceeded `MAX_LINE_LEN`; bytes up to the next `\n` are dropped
    Overflow,
    /// Completed line was not valid UTF-8
    InvalidUtf8,
}

/// A complete line
pub type Line = String<MAX_LINE_LEN>;

/// Byte-at-a-time line assembler
#[derive(Debug, Clone)]
pub struct LineAssembler {
    state: AssemblerState,
    buffer: Vec<u8, MAX_LINE_LEN>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssemblerState {
    /// Collecting bytes of the current line
    Collecting,
    /// Current line overflowed; skipping until the next terminator
    Discarding,
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl LineAssembler {
    /// Create an empty assembler
    pub fn new() -> Self {
        Self {
            state: AssemblerState::Collecting,
            buffer: Vec::new(),
        }
    }

    /// Drop any partial line
    pub fn reset(&mut self) {
        self.state = AssemblerState::Collecting;
        self.buffer.clear();
    }

    /// Number of bytes buffered for the current line
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Feed a single byte
    ///
    /// Returns `Ok(Some(line))` when a non-empty line completes, `Ok(None)`
    /// when more bytes are needed. An overflow is reported once, on the byte
    /// that overflowed.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Line>, LineError> {
        match byte {
            b'\r' | b'\0' => Ok(None),
            b'\n' => {
                if self.state == AssemblerState::Discarding {
                    self.reset();
                    return Ok(None);
                }
                if self.buffer.is_empty() {
                    return Ok(None);
                }

                let result = core::str::from_utf8(&self.buffer)
                    .map_err(|_| LineError::InvalidUtf8)
                    .map(|s| {
                        let mut line = Line::new();
                        // Capacity matches the buffer, cannot fail
                        let _ = line.push_str(s);
                        line
                    });
                self.buffer.clear();
                result.map(Some)
            }
            _ => match self.state {
                AssemblerState::Discarding => Ok(None),
                AssemblerState::Collecting => {
                    if self.buffer.push(byte).is_err() {
                        self.buffer.clear();
                        self.state = AssemblerState::Discarding;
                        return Err(LineError::Overflow);
                    }
                    Ok(None)
                }
            },
        }
    }

    /// Feed a chunk, invoking `on_line` for every completed line
    ///
    /// Returns the number of errors encountered in the chunk.
    pub fn feed_chunk<F>(&mut self, bytes: &[u8], mut on_line: F) -> usize
    where
        F: FnMut(&str),
    {
        let mut errors = 0;
        for &byte in bytes {
            match self.feed(byte) {
                Ok(Some(line)) => on_line(line.as_str()),
                Ok(None) => {}
                Err(_) => errors += 1,
            }
        }
        errors
    }
}
