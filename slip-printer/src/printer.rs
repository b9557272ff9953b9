//! Text destinations: OS print queue, plain file and debug sink
//!
//! None of these speak ESC/POS. Control lines are ignored, except that an
//! HTML queue document renders bold as `<b>`.

use tracing::{info, instrument};

use crate::encoder::{DocumentState, LinePrinter};
use crate::error::{PrintError, PrintResult};
use crate::format::FormattedLine;
use crate::queue::QueueFormat;
use crate::transport::{DeviceTransport, QueueTransport, Transport};

/// Markup of a text document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextMarkup {
    #[default]
    Plain,
    Html,
}

/// Writes formatted lines as text to a transport
#[derive(Debug)]
pub struct TextPrinter<T> {
    transport: T,
    markup: TextMarkup,
    state: DocumentState,
    bold: bool,
}

/// Generic OS print queue
pub type QueuePrinter = TextPrinter<QueueTransport>;

/// Formatted lines written verbatim to a file
pub type FilePrinter = TextPrinter<DeviceTransport>;

impl<T: Transport> TextPrinter<T> {
    pub fn new(transport: T, markup: TextMarkup) -> Self {
        Self {
            transport,
            markup,
            state: DocumentState::Idle,
            bold: false,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    async fn send(&mut self, text: &str) -> PrintResult<()> {
        if self.state != DocumentState::DocumentOpen {
            return Err(PrintError::InvalidState(format!(
                "no open document (state: {:?})",
                self.state
            )));
        }
        self.transport.write(text.as_bytes()).await
    }

    fn set_bold(&mut self, on: bool) {
        if self.markup == TextMarkup::Html {
            self.bold = on;
        }
    }
}

impl QueuePrinter {
    /// Queue printer for `name`; `markup` selects plain text or HTML
    pub fn queue(name: &str, markup: TextMarkup, timeout: std::time::Duration) -> Self {
        let format = match markup {
            TextMarkup::Plain => QueueFormat::Text,
            TextMarkup::Html => QueueFormat::Html,
        };
        Self::new(QueueTransport::new(name, format).with_timeout(timeout), markup)
    }
}

impl FilePrinter {
    pub fn file(path: impl Into<std::path::PathBuf>, timeout: std::time::Duration) -> Self {
        Self::new(
            DeviceTransport::file(path).with_timeout(timeout),
            TextMarkup::Plain,
        )
    }
}

const HTML_HEADER: &str = "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"></head>\n<body><pre style=\"font-family: monospace\">\n";
const HTML_FOOTER: &str = "</pre></body></html>\n";

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

impl<T: Transport> LinePrinter for TextPrinter<T> {
    #[instrument(skip(self), fields(dest = %self.transport.describe()))]
    async fn start_document(&mut self) -> PrintResult<()> {
        if self.state == DocumentState::DocumentOpen {
            return Err(PrintError::InvalidState("document already open".to_string()));
        }
        self.transport.open().await?;
        self.state = DocumentState::DocumentOpen;
        self.bold = false;
        if self.markup == TextMarkup::Html {
            self.send(HTML_HEADER).await?;
        }
        Ok(())
    }

    async fn write_line(&mut self, line: &FormattedLine) -> PrintResult<()> {
        let rendered = match self.markup {
            TextMarkup::Plain => format!("{}\n", line.text),
            TextMarkup::Html if self.bold => format!("<b>{}</b>\n", escape_html(&line.text)),
            TextMarkup::Html => format!("{}\n", escape_html(&line.text)),
        };
        self.send(&rendered).await
    }

    async fn enable_bold(&mut self) -> PrintResult<()> {
        self.set_bold(true);
        Ok(())
    }

    async fn disable_bold(&mut self) -> PrintResult<()> {
        self.set_bold(false);
        Ok(())
    }

    async fn end_document(&mut self) -> PrintResult<()> {
        if self.state != DocumentState::DocumentOpen {
            return Ok(());
        }
        let footer = if self.markup == TextMarkup::Html {
            self.send(HTML_FOOTER).await
        } else {
            Ok(())
        };
        self.state = DocumentState::Closed;
        let closed = self.transport.close().await;
        footer.and(closed)
    }

    fn state(&self) -> DocumentState {
        self.state
    }

    fn delivers_on_close(&self) -> bool {
        self.transport.buffers_until_close()
    }
}

/// Development sink: no hardware, the document is logged when closed
#[derive(Debug, Default)]
pub struct DebugPrinter {
    name: String,
    output: String,
    state: DocumentState,
    controls: Vec<String>,
}

impl DebugPrinter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Text of the last document
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Control operations seen in the last document, in order
    pub fn controls(&self) -> &[String] {
        &self.controls
    }

    fn note(&mut self, op: impl Into<String>) -> PrintResult<()> {
        if self.state != DocumentState::DocumentOpen {
            return Err(PrintError::InvalidState("no open document".to_string()));
        }
        self.controls.push(op.into());
        Ok(())
    }
}

impl LinePrinter for DebugPrinter {
    async fn start_document(&mut self) -> PrintResult<()> {
        if self.state == DocumentState::DocumentOpen {
            return Err(PrintError::InvalidState("document already open".to_string()));
        }
        self.output.clear();
        self.controls.clear();
        self.state = DocumentState::DocumentOpen;
        Ok(())
    }

    async fn write_line(&mut self, line: &FormattedLine) -> PrintResult<()> {
        if self.state != DocumentState::DocumentOpen {
            return Err(PrintError::InvalidState("no open document".to_string()));
        }
        self.output.push_str(&line.text);
        self.output.push('\n');
        Ok(())
    }

    async fn enable_bold(&mut self) -> PrintResult<()> {
        self.note("bold on")
    }

    async fn disable_bold(&mut self) -> PrintResult<()> {
        self.note("bold off")
    }

    async fn cut(&mut self) -> PrintResult<()> {
        self.note("cut")
    }

    async fn beep(&mut self) -> PrintResult<()> {
        self.note("beep")
    }

    async fn beep_with(&mut self, count: u8, duration: u8) -> PrintResult<()> {
        self.note(format!("beep {}x{}", count, duration))
    }

    async fn open_cash_drawer(&mut self) -> PrintResult<()> {
        self.note("drawer")
    }

    async fn print_bitmap(&mut self, path: &str) -> PrintResult<()> {
        self.note(format!("bitmap {}", path))
    }

    async fn exec_command(&mut self, raw: &str) -> PrintResult<()> {
        self.note(format!("command {}", raw))
    }

    async fn end_document(&mut self) -> PrintResult<()> {
        if self.state != DocumentState::DocumentOpen {
            return Ok(());
        }
        self.state = DocumentState::Closed;
        info!(
            printer = %self.name,
            lines = self.output.lines().count(),
            controls = ?self.controls,
            "Demo print:\n{}",
            self.output
        );
        Ok(())
    }

    fn state(&self) -> DocumentState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::{Alignment, FontHint};
    use crate::transport::MemoryTransport;

    fn line(s: &str) -> FormattedLine {
        FormattedLine::text(s, Alignment::Left, FontHint::default())
    }

    #[tokio::test]
    async fn test_plain_text_ignores_bold() {
        let mut p = TextPrinter::new(MemoryTransport::new(), TextMarkup::Plain);
        p.start_document().await.unwrap();
        p.enable_bold().await.unwrap();
        p.write_line(&line("a < b")).await.unwrap();
        p.cut().await.unwrap();
        p.end_document().await.unwrap();
        assert_eq!(p.transport().data(), b"a < b\n");
    }

    #[tokio::test]
    async fn test_html_renders_bold() {
        let mut p = TextPrinter::new(MemoryTransport::new(), TextMarkup::Html);
        p.start_document().await.unwrap();
        p.write_line(&line("plain")).await.unwrap();
        p.enable_bold().await.unwrap();
        p.write_line(&line("a & b")).await.unwrap();
        p.disable_bold().await.unwrap();
        p.end_document().await.unwrap();

        let html = String::from_utf8(p.into_transport().into_data()).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("plain\n<b>a &amp; b</b>\n"));
        assert!(html.ends_with(HTML_FOOTER));
    }

    #[tokio::test]
    async fn test_file_printer_writes_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipt.txt");
        let mut p = FilePrinter::file(&path, std::time::Duration::from_secs(1));
        p.start_document().await.unwrap();
        p.write_line(&line("one")).await.unwrap();
        p.write_line(&line("  two")).await.unwrap();
        p.end_document().await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\n  two\n");
    }

    #[tokio::test]
    async fn test_debug_printer_records() {
        let mut p = DebugPrinter::new("demo");
        p.start_document().await.unwrap();
        p.write_line(&line("Hello")).await.unwrap();
        p.beep_with(2, 4).await.unwrap();
        p.cut().await.unwrap();
        p.end_document().await.unwrap();
        p.end_document().await.unwrap();
        assert_eq!(p.output(), "Hello\n");
        assert_eq!(p.controls(), &["beep 2x4".to_string(), "cut".to_string()]);
        assert_eq!(p.state(), DocumentState::Closed);
    }
}
