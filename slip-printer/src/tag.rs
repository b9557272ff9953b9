//! Inline control tag parser
//!
//! A line may begin with a tag of the form `<name[digits]>payload`:
//!
//! - `<eb>` / `<db>`: enable / disable bold
//! - `<cut>`, `<beep>`, `<drawer>`
//! - `<b23>`: beep 2 times, duration 3
//! - `<bmp>logo.png`: print a bitmap file
//! - `<xct>27,112,0,25,250`: raw command bytes
//! - `<l>`, `<r>`, `<c>`, `<t>`, `<j>`, `<f>`: alignment, with an optional
//!   two-digit font hint (`<c11>` = height 1, width 1)
//!
//! Anything that does not match the tag grammar is plain text.

/// Leading character that marks a tag
pub const SENTINEL: char = '<';

const CLOSE: char = '>';

/// Device operation requested by a control line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlTag {
    EnableBold,
    DisableBold,
    Cut,
    Beep,
    /// `ESC B n t` with explicit count and duration
    BeepWith { count: u8, duration: u8 },
    Drawer,
    Bitmap(String),
    RawCommand(String),
    /// Well-formed tag with an unknown name, ignored by printers
    Unknown(String),
}

/// Text alignment requested by an alignment tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Right,
    Center,
    /// Centered, printed at double height and width unless hinted otherwise
    Title,
    /// `left|right` spread across the line
    Justify,
    /// Payload repeated across the line
    Fill,
}

/// Font magnification hint, each axis 0..=7 (0 = normal size)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FontHint {
    pub height: u8,
    pub width: u8,
}

impl FontHint {
    pub fn new(height: u8, width: u8) -> Self {
        Self {
            height: height.min(7),
            width: width.min(7),
        }
    }

    pub fn is_normal(&self) -> bool {
        self.height == 0 && self.width == 0
    }
}

/// Tag found at the start of a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineTag {
    Align(Alignment, FontHint),
    Control(ControlTag),
}

/// A line split into its tag (if any) and payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine<'a> {
    pub tag: Option<LineTag>,
    pub payload: &'a str,
}

impl<'a> ParsedLine<'a> {
    fn plain(line: &'a str) -> Self {
        Self {
            tag: None,
            payload: line,
        }
    }

    pub fn control(&self) -> Option<&ControlTag> {
        match &self.tag {
            Some(LineTag::Control(c)) => Some(c),
            _ => None,
        }
    }
}

/// Parse a single line
///
/// Never fails: malformed tags degrade to plain text.
pub fn parse_line(line: &str) -> ParsedLine<'_> {
    let Some(rest) = line.strip_prefix(SENTINEL) else {
        return ParsedLine::plain(line);
    };
    let Some(close) = rest.find(CLOSE) else {
        return ParsedLine::plain(line);
    };

    let token = &rest[..close];
    let payload = &rest[close + CLOSE.len_utf8()..];

    let name_len = token
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(token.len());
    let (name, digits) = token.split_at(name_len);

    if name.is_empty() || digits.len() > 2 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return ParsedLine::plain(line);
    }

    let name = name.to_ascii_lowercase();
    let params: Vec<u8> = digits.bytes().map(|b| b - b'0').collect();
    let param = |i: usize| params.get(i).copied();

    let tag = match name.as_str() {
        "eb" => LineTag::Control(ControlTag::EnableBold),
        "db" => LineTag::Control(ControlTag::DisableBold),
        "cut" => LineTag::Control(ControlTag::Cut),
        "beep" => LineTag::Control(ControlTag::Beep),
        "b" => LineTag::Control(ControlTag::BeepWith {
            count: param(0).unwrap_or(1).max(1),
            duration: param(1).unwrap_or(3).max(1),
        }),
        "drawer" => LineTag::Control(ControlTag::Drawer),
        "bmp" => LineTag::Control(ControlTag::Bitmap(payload.trim().to_string())),
        "xct" => LineTag::Control(ControlTag::RawCommand(payload.trim().to_string())),
        "l" | "r" | "c" | "t" | "j" | "f" => {
            let alignment = match name.as_str() {
                "l" => Alignment::Left,
                "r" => Alignment::Right,
                "c" => Alignment::Center,
                "t" => Alignment::Title,
                "j" => Alignment::Justify,
                _ => Alignment::Fill,
            };
            let hint = match (alignment, param(0), param(1)) {
                (_, Some(h), Some(w)) => FontHint::new(h, w),
                (_, Some(h), None) => FontHint::new(h, 0),
                (Alignment::Title, None, _) => FontHint::new(1, 1),
                _ => FontHint::default(),
            };
            LineTag::Align(alignment, hint)
        }
        _ => LineTag::Control(ControlTag::Unknown(name)),
    };

    ParsedLine {
        tag: Some(tag),
        payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_line_passes_through() {
        let parsed = parse_line("Hello World");
        assert_eq!(parsed.tag, None);
        assert_eq!(parsed.payload, "Hello World");
    }

    #[test]
    fn test_control_tags() {
        assert_eq!(parse_line("<cut>").control(), Some(&ControlTag::Cut));
        assert_eq!(parse_line("<EB>").control(), Some(&ControlTag::EnableBold));
        assert_eq!(parse_line("<db>").control(), Some(&ControlTag::DisableBold));
        assert_eq!(parse_line("<drawer>").control(), Some(&ControlTag::Drawer));
        assert_eq!(parse_line("<beep>").control(), Some(&ControlTag::Beep));
    }

    #[test]
    fn test_beep_with_params() {
        assert_eq!(
            parse_line("<b25>").control(),
            Some(&ControlTag::BeepWith {
                count: 2,
                duration: 5
            })
        );
        assert_eq!(
            parse_line("<b>").control(),
            Some(&ControlTag::BeepWith {
                count: 1,
                duration: 3
            })
        );
    }

    #[test]
    fn test_payload_tags() {
        assert_eq!(
            parse_line("<bmp>logo.png").control(),
            Some(&ControlTag::Bitmap("logo.png".into()))
        );
        assert_eq!(
            parse_line("<xct> 27,112,0 ").control(),
            Some(&ControlTag::RawCommand("27,112,0".into()))
        );
    }

    #[test]
    fn test_alignment_tags() {
        let parsed = parse_line("<r>Total");
        assert_eq!(
            parsed.tag,
            Some(LineTag::Align(Alignment::Right, FontHint::default()))
        );
        assert_eq!(parsed.payload, "Total");

        let parsed = parse_line("<c12>Welcome");
        assert_eq!(
            parsed.tag,
            Some(LineTag::Align(Alignment::Center, FontHint::new(1, 2)))
        );

        let parsed = parse_line("<t>RECEIPT");
        assert_eq!(
            parsed.tag,
            Some(LineTag::Align(Alignment::Title, FontHint::new(1, 1)))
        );
    }

    #[test]
    fn test_unknown_tag_is_not_plain_text() {
        assert_eq!(
            parse_line("<qr>data").control(),
            Some(&ControlTag::Unknown("qr".into()))
        );
    }

    #[test]
    fn test_malformed_tags_are_plain_text() {
        for line in ["<", "<>", "<cut", "<12>x", "<c123>x", "<c1a>x", "a <cut>", "< cut>"] {
            let parsed = parse_line(line);
            assert_eq!(parsed.tag, None, "{line:?} should be plain");
            assert_eq!(parsed.payload, line);
        }
    }

    #[test]
    fn test_font_hint_clamps() {
        assert_eq!(FontHint::new(9, 8), FontHint::new(7, 7));
    }
}
