//! Line alignment policies
//!
//! Widths are measured in `char`s. None of the formatters truncate: text
//! wider than the line is returned as-is (or pushed right, for center).

use crate::tag::{Alignment, ControlTag, FontHint};

/// Separator between the left and right parts of a justified line
pub const JUSTIFY_SEPARATOR: char = '|';

/// A line ready for a printer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedLine {
    pub text: String,
    pub alignment: Alignment,
    pub font: FontHint,
    /// Control operation this line stands for, if any
    pub tag: Option<ControlTag>,
}

impl FormattedLine {
    pub fn text(text: impl Into<String>, alignment: Alignment, font: FontHint) -> Self {
        Self {
            text: text.into(),
            alignment,
            font,
            tag: None,
        }
    }

    pub fn control(tag: ControlTag) -> Self {
        Self {
            text: String::new(),
            alignment: Alignment::Left,
            font: FontHint::default(),
            tag: Some(tag),
        }
    }

    pub fn is_control(&self) -> bool {
        self.tag.is_some()
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn pad_left(text: &str, target: usize) -> String {
    let len = char_len(text);
    if len >= target {
        return text.to_string();
    }
    format!("{}{}", " ".repeat(target - len), text)
}

/// Left alignment: the text unchanged
pub fn format_left(text: &str, _width: usize) -> String {
    text.to_string()
}

/// Right alignment: left-padded with spaces up to `width`
pub fn format_right(text: &str, width: usize) -> String {
    pad_left(text, width)
}

/// Center alignment: left-padded to `(width + len) / 2`
///
/// Odd differences put the extra space on the right side (it is simply
/// not emitted).
pub fn format_center(text: &str, width: usize) -> String {
    pad_left(text, (width + char_len(text)) / 2)
}

/// Justify `left|right` across `width`
///
/// Without a separator the line is left aligned. Overlong parts are kept
/// apart by a single space.
pub fn format_justify(text: &str, width: usize) -> String {
    let Some((left, right)) = text.split_once(JUSTIFY_SEPARATOR) else {
        return text.to_string();
    };
    let used = char_len(left) + char_len(right);
    let gap = width.saturating_sub(used).max(1);
    format!("{}{}{}", left, " ".repeat(gap), right)
}

/// Repeat `text` until the line is exactly `width` chars
pub fn format_fill(text: &str, width: usize) -> String {
    let pattern = if text.is_empty() { "-" } else { text };
    pattern.chars().cycle().take(width).collect()
}

/// Apply an alignment policy
pub fn format(text: &str, alignment: Alignment, width: usize) -> String {
    match alignment {
        Alignment::Left => format_left(text, width),
        Alignment::Right => format_right(text, width),
        Alignment::Center | Alignment::Title => format_center(text, width),
        Alignment::Justify => format_justify(text, width),
        Alignment::Fill => format_fill(text, width),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_left_is_identity() {
        assert_eq!(format_left("abc", 10), "abc");
        assert_eq!(format_left("", 10), "");
    }

    #[test]
    fn test_right_pads_to_width() {
        assert_eq!(format_right("abc", 6), "   abc");
        assert_eq!(format_right("abcdef", 4), "abcdef");
        assert_eq!(format_right("abc", 3), "abc");
        assert_eq!(format_right("", 2), "  ");
    }

    #[test]
    fn test_right_length_property() {
        for width in 0..20 {
            for text in ["", "a", "hello", "a longer piece of text"] {
                let out = format_right(text, width);
                assert_eq!(out.chars().count(), width.max(text.len()));
                assert!(out.ends_with(text));
                assert!(out[..out.len() - text.len()].chars().all(|c| c == ' '));
            }
        }
    }

    #[test]
    fn test_center_padding_formula() {
        // (10 + 5) / 2 = 7 -> 2 leading spaces
        assert_eq!(format_center("Hello", 10), "  Hello");
        // (10 + 4) / 2 = 7 -> 3 leading spaces
        assert_eq!(format_center("Hell", 10), "   Hell");
        for width in 0..20 {
            for text in ["", "ab", "centered", "much longer than the line"] {
                let len = text.len();
                let pad = ((width + len) / 2).saturating_sub(len);
                assert_eq!(format_center(text, width), format!("{}{}", " ".repeat(pad), text));
            }
        }
    }

    #[test]
    fn test_center_counts_chars_not_bytes() {
        assert_eq!(format_center("Café", 8), "  Café");
    }

    #[test]
    fn test_justify() {
        assert_eq!(format_justify("Total|9.50", 16), "Total       9.50");
        assert_eq!(format_justify("Very long label|123", 10), "Very long label 123");
        assert_eq!(format_justify("no separator", 20), "no separator");
    }

    #[test]
    fn test_fill() {
        assert_eq!(format_fill("=", 5), "=====");
        assert_eq!(format_fill("-=", 5), "-=-=-");
        assert_eq!(format_fill("", 3), "---");
        assert_eq!(format_fill("*", 0), "");
    }

    #[test]
    fn test_title_uses_center() {
        assert_eq!(format("Hi", Alignment::Title, 6), format_center("Hi", 6));
    }
}
