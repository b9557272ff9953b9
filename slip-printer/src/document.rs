//! Formatted document: logical lines expanded into formatted lines

use crate::format::{self, FormattedLine};
use crate::tag::{parse_line, Alignment, FontHint, LineTag};

/// An ordered sequence of formatted lines for one print request
///
/// Index `i` of [`lines`](Self::lines) always corresponds to input line `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedDocument {
    width: usize,
    lines: Vec<FormattedLine>,
}

impl FormattedDocument {
    /// Format `lines` for a printer `width` characters wide
    pub fn new<S: AsRef<str>>(lines: &[S], width: usize) -> Self {
        Self::build(lines, width, true)
    }

    /// Format `lines` against the full width, for destinations that print
    /// every font hint at normal size
    pub fn unscaled<S: AsRef<str>>(lines: &[S], width: usize) -> Self {
        Self::build(lines, width, false)
    }

    fn build<S: AsRef<str>>(lines: &[S], width: usize, scaled: bool) -> Self {
        let lines = lines
            .iter()
            .map(|line| format_logical_line(line.as_ref(), width, scaled))
            .collect();
        Self { width, lines }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn lines(&self) -> &[FormattedLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Newline-joined text of every non-control line
    pub fn to_plain_text(&self) -> String {
        self.lines
            .iter()
            .filter(|l| !l.is_control())
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Columns available to text printed `font_width + 1` times wider than normal
fn effective_width(width: usize, font: FontHint) -> usize {
    width / (font.width as usize + 1)
}

fn format_logical_line(line: &str, width: usize, scaled: bool) -> FormattedLine {
    let parsed = parse_line(line);
    match parsed.tag {
        None => FormattedLine::text(parsed.payload, Alignment::Left, FontHint::default()),
        Some(LineTag::Align(alignment, font)) => {
            let columns = if scaled {
                effective_width(width, font)
            } else {
                width
            };
            let text = format::format(parsed.payload, alignment, columns);
            FormattedLine::text(text, alignment, font)
        }
        Some(LineTag::Control(tag)) => FormattedLine::control(tag),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::ControlTag;

    #[test]
    fn test_one_formatted_line_per_input_line() {
        let input = ["Hello", "", "<eb>", "<r>x", "<zz>", "<broken", "<cut>"];
        for width in [0, 1, 10, 48] {
            let doc = FormattedDocument::new(&input, width);
            assert_eq!(doc.len(), input.len());
        }
    }

    #[test]
    fn test_plain_lines_default_left() {
        let doc = FormattedDocument::new(&["Hello", ""], 10);
        assert_eq!(doc.lines()[0].text, "Hello");
        assert_eq!(doc.lines()[0].alignment, Alignment::Left);
        assert_eq!(doc.lines()[1].text, "");
    }

    #[test]
    fn test_alignment_tags_applied() {
        let doc = FormattedDocument::new(&["<r>42", "<c>Hi", "<j>A|B", "<f>="], 6);
        let texts: Vec<_> = doc.lines().iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["    42", "  Hi", "A    B", "======"]);
    }

    #[test]
    fn test_double_width_halves_columns() {
        let doc = FormattedDocument::new(&["<r01>42"], 10);
        let line = &doc.lines()[0];
        assert_eq!(line.text, "   42");
        assert_eq!(line.font, FontHint::new(0, 1));
    }

    #[test]
    fn test_unscaled_keeps_full_width() {
        let doc = FormattedDocument::unscaled(&["<t>Hi", "<c>Hi", "<r01>42"], 10);
        let texts: Vec<_> = doc.lines().iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["    Hi", "    Hi", "        42"]);
        assert_eq!(doc.lines()[0].font, FontHint::new(1, 1));
    }

    #[test]
    fn test_control_lines_keep_their_tag() {
        let doc = FormattedDocument::new(&["<bmp>logo.png", "<xyz>"], 10);
        assert_eq!(
            doc.lines()[0].tag,
            Some(ControlTag::Bitmap("logo.png".into()))
        );
        assert_eq!(doc.lines()[1].tag, Some(ControlTag::Unknown("xyz".into())));
    }

    #[test]
    fn test_plain_text_rendering_skips_controls() {
        let doc = FormattedDocument::new(&["Hello", "<eb>", "<r>World", "<cut>"], 8);
        assert_eq!(doc.to_plain_text(), "Hello\n   World");
    }
}
