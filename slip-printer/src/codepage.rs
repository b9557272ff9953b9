//! Code page handling
//!
//! Maps a Windows-style code page number to a text encoder and to the
//! ESC/POS commands that put the printer into the matching character table.
//! Characters the code page cannot represent print as `?`.

use encoding_rs::{EncoderResult, Encoding};
use tracing::warn;

/// A printer code page
#[derive(Debug, Clone, Copy)]
pub struct CodePage {
    number: u16,
    encoding: Option<&'static Encoding>,
}

impl CodePage {
    pub fn new(number: u16) -> Self {
        let encoding = lookup(number);
        if encoding.is_none() {
            warn!(code_page = number, "unsupported code page, printing ASCII only");
        }
        Self { number, encoding }
    }

    pub fn number(&self) -> u16 {
        self.number
    }

    /// Name of the backing encoding, `None` for the ASCII fallback
    pub fn encoding_name(&self) -> Option<&'static str> {
        self.encoding.map(|e| e.name())
    }

    fn is_gbk(&self) -> bool {
        matches!(self.number, 936 | 54936)
    }

    /// Encode text for the printer
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self.encoding {
            Some(encoding) => encode_with(encoding, text),
            None => text
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
        }
    }

    /// Commands selecting this code page after `ESC @`
    pub fn preamble(&self) -> Vec<u8> {
        if self.is_gbk() {
            // FS & (Chinese mode) + FS C 1 (GBK)
            return vec![0x1C, 0x26, 0x1C, 0x43, 0x01];
        }
        match epson_table(self.number) {
            // ESC t n
            Some(n) => vec![0x1B, 0x74, n],
            None => Vec::new(),
        }
    }

    /// Commands leaving multi-byte mode at the end of a document
    pub fn epilogue(&self) -> Vec<u8> {
        if self.is_gbk() {
            // FS .
            vec![0x1C, 0x2E]
        } else {
            Vec::new()
        }
    }
}

impl Default for CodePage {
    fn default() -> Self {
        Self::new(1252)
    }
}

fn lookup(number: u16) -> Option<&'static Encoding> {
    use encoding_rs::*;

    let encoding = match number {
        866 => IBM866,
        874 => WINDOWS_874,
        932 => SHIFT_JIS,
        936 => GBK,
        949 => EUC_KR,
        950 => BIG5,
        1250 => WINDOWS_1250,
        1251 => WINDOWS_1251,
        1252 | 28591 => WINDOWS_1252,
        1253 => WINDOWS_1253,
        1254 => WINDOWS_1254,
        1255 => WINDOWS_1255,
        1256 => WINDOWS_1256,
        1257 => WINDOWS_1257,
        1258 => WINDOWS_1258,
        10000 => MACINTOSH,
        20866 => KOI8_R,
        21866 => KOI8_U,
        28592 => ISO_8859_2,
        28593 => ISO_8859_3,
        28594 => ISO_8859_4,
        28595 => ISO_8859_5,
        28596 => ISO_8859_6,
        28597 => ISO_8859_7,
        28598 => ISO_8859_8,
        28605 => ISO_8859_15,
        54936 => GB18030,
        65001 => UTF_8,
        _ => return None,
    };
    Some(encoding)
}

/// Epson `ESC t` character table for single-byte code pages
fn epson_table(number: u16) -> Option<u8> {
    let table = match number {
        1252 | 28591 => 16,
        866 => 17,
        1250 => 45,
        1251 => 46,
        1253 => 47,
        1254 => 48,
        1255 => 49,
        1256 => 50,
        1257 => 51,
        1258 => 52,
        _ => return None,
    };
    Some(table)
}

fn encode_with(encoding: &'static Encoding, text: &str) -> Vec<u8> {
    let mut encoder = encoding.output_encoding().new_encoder();
    let mut out = Vec::with_capacity(text.len() + 16);
    let mut src = text;

    loop {
        let needed = encoder
            .max_buffer_length_from_utf8_without_replacement(src.len())
            .unwrap_or(src.len() * 4 + 16);
        out.reserve(needed);

        let (result, read) =
            encoder.encode_from_utf8_to_vec_without_replacement(src, &mut out, true);
        src = &src[read..];

        match result {
            EncoderResult::InputEmpty => break,
            EncoderResult::OutputFull => continue,
            EncoderResult::Unmappable(c) => {
                warn!(character = %c, encoding = encoding.name(), "unmappable character");
                out.push(b'?');
            }
        }
    }

    out
}
