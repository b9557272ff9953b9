//! Line printer protocol
//!
//! [`LinePrinter`] is the uniform call contract every destination
//! implements; control operations a destination cannot perform default to
//! no-ops. [`EscPosPrinter`] is the byte-level implementation for receipt
//! printers.

use tracing::{debug, instrument, warn};

use crate::bitmap;
use crate::codepage::CodePage;
use crate::error::{PrintError, PrintResult};
use crate::escpos::{parse_raw_command, EscPosBuilder};
use crate::format::FormattedLine;
use crate::profile::PrinterProfile;
use crate::tag::ControlTag;
use crate::transport::Transport;

/// Lines fed before a cut so the last printed line clears the cutter
const CUT_FEED_LINES: u8 = 3;

/// Default buzzer pattern for `<beep>`
const DEFAULT_BEEP: (u8, u8) = (1, 3);

/// Lifecycle of one document on a printer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentState {
    #[default]
    Idle,
    DocumentOpen,
    Closed,
}

/// Operations a print destination understands
#[allow(async_fn_in_trait)]
pub trait LinePrinter {
    /// Open the destination. Valid from `Idle` or `Closed`.
    async fn start_document(&mut self) -> PrintResult<()>;

    /// Print one formatted text line
    async fn write_line(&mut self, line: &FormattedLine) -> PrintResult<()>;

    async fn enable_bold(&mut self) -> PrintResult<()> {
        Ok(())
    }

    async fn disable_bold(&mut self) -> PrintResult<()> {
        Ok(())
    }

    async fn cut(&mut self) -> PrintResult<()> {
        Ok(())
    }

    async fn beep(&mut self) -> PrintResult<()> {
        Ok(())
    }

    async fn beep_with(&mut self, _count: u8, _duration: u8) -> PrintResult<()> {
        Ok(())
    }

    async fn open_cash_drawer(&mut self) -> PrintResult<()> {
        Ok(())
    }

    async fn print_bitmap(&mut self, _path: &str) -> PrintResult<()> {
        Ok(())
    }

    async fn exec_command(&mut self, _raw: &str) -> PrintResult<()> {
        Ok(())
    }

    /// Flush and release the destination. A no-op unless a document is open.
    async fn end_document(&mut self) -> PrintResult<()>;

    fn state(&self) -> DocumentState;

    /// Whether font hints change the printed character size
    fn renders_font_size(&self) -> bool {
        false
    }

    /// Whether output is only handed over when the document is closed
    fn delivers_on_close(&self) -> bool {
        false
    }
}

/// What [`dispatch_line`] did with a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    Text,
    Control,
    Ignored,
}

/// Route one formatted line to the matching printer operation
pub async fn dispatch_line<P: LinePrinter>(
    printer: &mut P,
    line: &FormattedLine,
) -> PrintResult<Dispatched> {
    let Some(tag) = &line.tag else {
        printer.write_line(line).await?;
        return Ok(Dispatched::Text);
    };

    match tag {
        ControlTag::EnableBold => printer.enable_bold().await?,
        ControlTag::DisableBold => printer.disable_bold().await?,
        ControlTag::Cut => printer.cut().await?,
        ControlTag::Beep => printer.beep().await?,
        ControlTag::BeepWith { count, duration } => printer.beep_with(*count, *duration).await?,
        ControlTag::Drawer => printer.open_cash_drawer().await?,
        ControlTag::Bitmap(path) => printer.print_bitmap(path).await?,
        ControlTag::RawCommand(raw) => printer.exec_command(raw).await?,
        ControlTag::Unknown(name) => {
            debug!(tag = %name, "Ignoring unknown tag");
            return Ok(Dispatched::Ignored);
        }
    }
    Ok(Dispatched::Control)
}

/// ESC/POS receipt printer over a byte transport
#[derive(Debug)]
pub struct EscPosPrinter<T> {
    transport: T,
    code_page: CodePage,
    width: usize,
    cut_on_end: bool,
    state: DocumentState,
    bold: bool,
}

impl<T: Transport> EscPosPrinter<T> {
    /// Create a printer with the specified paper width in characters
    ///
    /// Common widths:
    /// - 58mm paper: 32 characters
    /// - 80mm paper: 48 characters
    pub fn new(transport: T, width: usize, code_page: CodePage) -> Self {
        Self {
            transport,
            code_page,
            width,
            cut_on_end: false,
            state: DocumentState::Idle,
            bold: false,
        }
    }

    pub fn from_profile(transport: T, profile: &PrinterProfile) -> Self {
        Self::new(transport, profile.chars_per_line, profile.code_page())
            .with_cut_on_end(profile.cut_on_end)
    }

    /// Cut the paper when the document is closed
    pub fn with_cut_on_end(mut self, cut_on_end: bool) -> Self {
        self.cut_on_end = cut_on_end;
        self
    }

    pub fn is_bold(&self) -> bool {
        self.bold
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    fn ensure_open(&self, op: &str) -> PrintResult<()> {
        if self.state == DocumentState::DocumentOpen {
            Ok(())
        } else {
            Err(PrintError::InvalidState(format!(
                "{} requires an open document (state: {:?})",
                op, self.state
            )))
        }
    }

    async fn send(&mut self, op: &str, b: EscPosBuilder) -> PrintResult<()> {
        self.ensure_open(op)?;
        if b.is_empty() {
            return Ok(());
        }
        self.transport.write(&b.build()).await
    }
}

impl<T: Transport> LinePrinter for EscPosPrinter<T> {
    #[instrument(skip(self), fields(dest = %self.transport.describe()))]
    async fn start_document(&mut self) -> PrintResult<()> {
        if self.state == DocumentState::DocumentOpen {
            return Err(PrintError::InvalidState("document already open".to_string()));
        }

        self.transport.open().await?;
        self.state = DocumentState::DocumentOpen;
        self.bold = false;

        let mut b = EscPosBuilder::new();
        b.reset().raw(&self.code_page.preamble());
        if let Err(e) = self.send("start_document", b).await {
            self.state = DocumentState::Closed;
            if let Err(close_err) = self.transport.close().await {
                warn!(error = %close_err, "Close after failed start");
            }
            return Err(e);
        }
        Ok(())
    }

    async fn write_line(&mut self, line: &FormattedLine) -> PrintResult<()> {
        let mut b = EscPosBuilder::new();
        let sized = !line.font.is_normal();
        if sized {
            b.size(line.font);
        }
        b.text(&self.code_page.encode(&line.text)).newline();
        if sized {
            b.reset_size();
        }
        self.send("write_line", b).await
    }

    async fn enable_bold(&mut self) -> PrintResult<()> {
        let mut b = EscPosBuilder::new();
        b.bold();
        self.send("enable_bold", b).await?;
        self.bold = true;
        Ok(())
    }

    async fn disable_bold(&mut self) -> PrintResult<()> {
        let mut b = EscPosBuilder::new();
        b.bold_off();
        self.send("disable_bold", b).await?;
        self.bold = false;
        Ok(())
    }

    async fn cut(&mut self) -> PrintResult<()> {
        let mut b = EscPosBuilder::new();
        b.cut_feed(CUT_FEED_LINES);
        self.send("cut", b).await
    }

    async fn beep(&mut self) -> PrintResult<()> {
        self.beep_with(DEFAULT_BEEP.0, DEFAULT_BEEP.1).await
    }

    async fn beep_with(&mut self, count: u8, duration: u8) -> PrintResult<()> {
        let mut b = EscPosBuilder::new();
        b.beep(count, duration);
        self.send("beep", b).await
    }

    async fn open_cash_drawer(&mut self) -> PrintResult<()> {
        let mut b = EscPosBuilder::new();
        b.open_drawer();
        self.send("open_cash_drawer", b).await
    }

    #[instrument(skip(self))]
    async fn print_bitmap(&mut self, path: &str) -> PrintResult<()> {
        self.ensure_open("print_bitmap")?;
        let dots = bitmap::dots_for_width(self.width);
        let owned = path.to_string();
        let raster = tokio::task::spawn_blocking(move || bitmap::load_raster(owned, dots))
            .await
            .map_err(|e| PrintError::Io(std::io::Error::other(e)))??;

        let mut b = EscPosBuilder::new();
        b.raw(&raster);
        self.send("print_bitmap", b).await
    }

    async fn exec_command(&mut self, raw: &str) -> PrintResult<()> {
        self.ensure_open("exec_command")?;
        let Some(bytes) = parse_raw_command(raw) else {
            warn!(command = raw, "Unparseable raw command, skipped");
            return Ok(());
        };
        let mut b = EscPosBuilder::new();
        b.raw(&bytes);
        self.send("exec_command", b).await
    }

    #[instrument(skip(self), fields(dest = %self.transport.describe()))]
    async fn end_document(&mut self) -> PrintResult<()> {
        if self.state != DocumentState::DocumentOpen {
            return Ok(());
        }

        let mut b = EscPosBuilder::new();
        if self.bold {
            b.bold_off();
        }
        if self.cut_on_end {
            b.cut_feed(CUT_FEED_LINES);
        }
        b.raw(&self.code_page.epilogue());
        let trailer = self.send("end_document", b).await;

        self.state = DocumentState::Closed;
        self.bold = false;
        let closed = self.transport.close().await;

        trailer.and(closed)
    }

    fn state(&self) -> DocumentState {
        self.state
    }

    fn renders_font_size(&self) -> bool {
        true
    }

    fn delivers_on_close(&self) -> bool {
        self.transport.buffers_until_close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::{Alignment, FontHint};
    use crate::transport::MemoryTransport;

    fn printer() -> EscPosPrinter<MemoryTransport> {
        EscPosPrinter::new(MemoryTransport::new(), 32, CodePage::new(1252))
    }

    fn text(s: &str) -> FormattedLine {
        FormattedLine::text(s, Alignment::Left, FontHint::default())
    }

    #[tokio::test]
    async fn test_document_lifecycle() {
        let mut p = printer();
        assert_eq!(p.state(), DocumentState::Idle);

        p.start_document().await.unwrap();
        assert_eq!(p.state(), DocumentState::DocumentOpen);
        assert!(p.transport().is_open());

        p.write_line(&text("Hi")).await.unwrap();
        p.end_document().await.unwrap();
        assert_eq!(p.state(), DocumentState::Closed);
        assert!(!p.transport().is_open());

        // ESC @ + ESC t 16, then the line
        assert_eq!(
            p.transport().data(),
            &[0x1B, 0x40, 0x1B, 0x74, 16, b'H', b'i', 0x0A]
        );
    }

    #[tokio::test]
    async fn test_end_document_twice_is_noop() {
        let mut p = printer();
        p.start_document().await.unwrap();
        p.end_document().await.unwrap();
        p.end_document().await.unwrap();
        assert_eq!(p.state(), DocumentState::Closed);
        assert_eq!(p.transport().cycles(), (1, 1));
    }

    #[tokio::test]
    async fn test_write_requires_open_document() {
        let mut p = printer();
        assert!(matches!(
            p.write_line(&text("x")).await,
            Err(PrintError::InvalidState(_))
        ));
        assert!(matches!(p.cut().await, Err(PrintError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_bold_is_sticky_and_reset_on_end() {
        let mut p = printer();
        p.start_document().await.unwrap();
        p.enable_bold().await.unwrap();
        p.write_line(&text("A")).await.unwrap();
        p.write_line(&text("B")).await.unwrap();
        assert!(p.is_bold());
        p.end_document().await.unwrap();

        let data = p.into_transport().into_data();
        assert_eq!(
            &data[5..],
            &[0x1B, 0x45, 0x01, b'A', 0x0A, b'B', 0x0A, 0x1B, 0x45, 0x00]
        );
    }

    #[tokio::test]
    async fn test_font_hint_wraps_line_in_size_commands() {
        let mut p = printer();
        p.start_document().await.unwrap();
        p.write_line(&FormattedLine::text("T", Alignment::Title, FontHint::new(1, 1)))
            .await
            .unwrap();
        let data = p.transport().data();
        assert_eq!(&data[5..], &[0x1D, 0x21, 0x11, b'T', 0x0A, 0x1D, 0x21, 0x00]);
    }

    #[tokio::test]
    async fn test_control_bytes() {
        let mut p = printer();
        p.start_document().await.unwrap();
        p.cut().await.unwrap();
        p.beep().await.unwrap();
        p.beep_with(2, 5).await.unwrap();
        p.open_cash_drawer().await.unwrap();
        p.exec_command("27,64").await.unwrap();
        let data = p.transport().data();
        assert_eq!(
            &data[5..],
            &[
                0x1D, 0x56, 0x42, 3, // cut
                0x1B, 0x42, 1, 3, // beep
                0x1B, 0x42, 2, 5, // beep_with
                0x1B, 0x70, 0x00, 25, 250, // drawer
                0x1B, 0x40, // raw
            ]
        );
    }

    #[tokio::test]
    async fn test_bad_raw_command_is_skipped() {
        let mut p = printer();
        p.start_document().await.unwrap();
        p.exec_command("not bytes").await.unwrap();
        assert_eq!(p.transport().data().len(), 5);
    }

    #[tokio::test]
    async fn test_missing_bitmap_reports_missing_resource() {
        let mut p = printer();
        p.start_document().await.unwrap();
        let err = p.print_bitmap("/no/such/logo.png").await.unwrap_err();
        assert!(matches!(err, PrintError::MissingResource(_)));
        assert_eq!(p.state(), DocumentState::DocumentOpen);
    }

    #[tokio::test]
    async fn test_cut_on_end_and_gbk_epilogue() {
        let mut p = EscPosPrinter::new(MemoryTransport::new(), 32, CodePage::new(936))
            .with_cut_on_end(true);
        p.start_document().await.unwrap();
        p.end_document().await.unwrap();
        assert_eq!(
            p.transport().data(),
            &[
                0x1B, 0x40, 0x1C, 0x26, 0x1C, 0x43, 0x01, // init + GBK
                0x1D, 0x56, 0x42, 3, // cut
                0x1C, 0x2E, // leave GBK
            ]
        );
    }

    #[tokio::test]
    async fn test_new_document_after_close() {
        let mut p = printer();
        p.start_document().await.unwrap();
        p.end_document().await.unwrap();
        p.start_document().await.unwrap();
        assert_eq!(p.state(), DocumentState::DocumentOpen);
        assert!(p.start_document().await.is_err());
    }

    #[tokio::test]
    async fn test_dispatch_routes_tags() {
        let mut p = printer();
        p.start_document().await.unwrap();
        assert_eq!(
            dispatch_line(&mut p, &text("x")).await.unwrap(),
            Dispatched::Text
        );
        assert_eq!(
            dispatch_line(&mut p, &FormattedLine::control(ControlTag::Cut))
                .await
                .unwrap(),
            Dispatched::Control
        );
        assert_eq!(
            dispatch_line(&mut p, &FormattedLine::control(ControlTag::Unknown("qr".into())))
                .await
                .unwrap(),
            Dispatched::Ignored
        );
    }
}
