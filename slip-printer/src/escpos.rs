//! ESC/POS command builder
//!
//! Provides a fluent API for building the byte sequence of one printed
//! line or control event. Text must already be encoded in the printer's
//! code page.

use crate::tag::FontHint;

/// ESC/POS command builder
pub struct EscPosBuilder {
    buf: Vec<u8>,
}

impl EscPosBuilder {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(64),
        }
    }

    // === Text Output ===

    /// Write code-page encoded text
    pub fn text(&mut self, encoded: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(encoded);
        self
    }

    /// Line feed
    pub fn newline(&mut self) -> &mut Self {
        self.buf.push(0x0A);
        self
    }

    // === Text Style ===

    pub fn bold(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x45, 0x01]);
        self
    }

    pub fn bold_off(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x45, 0x00]);
        self
    }

    /// Character size from a font hint
    pub fn size(&mut self, font: FontHint) -> &mut Self {
        // GS ! n - width in bits 4-6, height in bits 0-2
        let n = (font.width.min(7) << 4) | font.height.min(7);
        self.buf.extend_from_slice(&[0x1D, 0x21, n]);
        self
    }

    /// Reset to normal size
    pub fn reset_size(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x21, 0x00]);
        self
    }

    // === Paper Control ===

    /// Full cut after feeding n lines
    ///
    /// GS V 66 n lets the printer manage the cutter-to-head distance.
    pub fn cut_feed(&mut self, lines: u8) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x56, 0x42, lines]);
        self
    }

    // === Buzzer ===

    /// Sound the buzzer `count` times, each `duration` x 100ms
    pub fn beep(&mut self, count: u8, duration: u8) -> &mut Self {
        // ESC B n t
        self.buf
            .extend_from_slice(&[0x1B, 0x42, count.clamp(1, 9), duration.clamp(1, 9)]);
        self
    }

    // === Cash Drawer ===

    /// Open cash drawer (pin 2)
    pub fn open_drawer(&mut self) -> &mut Self {
        // ESC p m t1 t2 - Generate pulse on pin m
        self.buf.extend_from_slice(&[0x1B, 0x70, 0x00, 25, 250]);
        self
    }

    // === Raw Commands ===

    /// Write raw bytes directly
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Reset printer to default state
    pub fn reset(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x40]);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for EscPosBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a raw command payload into bytes
///
/// Accepts decimal (`27`) or hex (`0x1B`, `1Bh`) values separated by
/// commas, spaces or semicolons. Returns `None` if any value is not a byte.
pub fn parse_raw_command(payload: &str) -> Option<Vec<u8>> {
    let bytes: Option<Vec<u8>> = payload
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(parse_byte)
        .collect();
    bytes.filter(|b| !b.is_empty())
}

fn parse_byte(token: &str) -> Option<u8> {
    let lower = token.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        u8::from_str_radix(hex, 16).ok()
    } else if let Some(hex) = lower.strip_suffix('h') {
        u8::from_str_radix(hex, 16).ok()
    } else {
        lower.parse().ok()
    }
}
