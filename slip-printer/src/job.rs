//! Print jobs
//!
//! A job formats the request, opens the printer, dispatches every line and
//! closes the printer again, also when a line fails.

use tracing::{error, info, instrument, warn};

use crate::document::FormattedDocument;
use crate::encoder::{dispatch_line, Dispatched, EscPosPrinter, LinePrinter};
use crate::error::{PrintError, PrintResult};
use crate::printer::{DebugPrinter, FilePrinter, QueuePrinter, TextMarkup};
use crate::profile::{PrinterClass, PrinterProfile};
use crate::transport::RawTransport;

/// Outcome of a completed job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobReport {
    /// Text lines written
    pub lines_written: usize,
    /// Control operations performed
    pub controls: usize,
    /// Unknown tags that were ignored
    pub ignored: usize,
    /// Lines skipped after a recoverable error (missing bitmap, ...)
    pub skipped: usize,
}

impl JobReport {
    /// Document lines handled so far, including ignored and skipped ones
    pub fn processed(&self) -> usize {
        self.delivered() + self.ignored + self.skipped
    }

    /// Lines that reached the printer: text lines and control operations
    pub fn delivered(&self) -> usize {
        self.lines_written + self.controls
    }
}

/// One print request against one printer
#[derive(Debug)]
pub struct PrintJob<P> {
    printer: P,
    width: usize,
}

/// ESC/POS bytes to a port, device or raw queue
pub type RawDeviceJob = PrintJob<EscPosPrinter<RawTransport>>;

/// Text or HTML document through the OS print queue
pub type GenericQueueJob = PrintJob<QueuePrinter>;

/// Formatted text written to a file
pub type FileSinkJob = PrintJob<FilePrinter>;

/// Logged instead of printed
pub type DebugSinkJob = PrintJob<DebugPrinter>;

impl<P: LinePrinter> PrintJob<P> {
    pub fn new(printer: P, width: usize) -> Self {
        Self { printer, width }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn printer(&self) -> &P {
        &self.printer
    }

    pub fn into_printer(self) -> P {
        self.printer
    }

    /// Format and print tagged text lines
    ///
    /// Wide font hints narrow the alignment width only on printers that
    /// render them.
    pub async fn print<S: AsRef<str>>(&mut self, lines: &[S]) -> PrintResult<JobReport> {
        let document = if self.printer.renders_font_size() {
            FormattedDocument::new(lines, self.width)
        } else {
            FormattedDocument::unscaled(lines, self.width)
        };
        self.print_document(&document).await
    }

    /// Print an already formatted document
    ///
    /// A transport error aborts the remaining lines and returns
    /// [`PrintError::PrintFailure`] with the number of lines delivered; the
    /// printer is still closed. On printers that only submit when closed a
    /// failed close delivers nothing, so `written` is 0.
    #[instrument(skip(self, document), fields(lines = document.len()))]
    pub async fn print_document(&mut self, document: &FormattedDocument) -> PrintResult<JobReport> {
        self.printer.start_document().await?;

        let mut report = JobReport::default();
        for (index, line) in document.lines().iter().enumerate() {
            match dispatch_line(&mut self.printer, line).await {
                Ok(Dispatched::Text) => report.lines_written += 1,
                Ok(Dispatched::Control) => report.controls += 1,
                Ok(Dispatched::Ignored) => report.ignored += 1,
                Err(e) if e.is_recoverable() => {
                    warn!(line = index, error = %e, "Line skipped");
                    report.skipped += 1;
                }
                Err(e) => {
                    error!(line = index, error = %e, "Print aborted");
                    let mut written = report.delivered();
                    if let Err(close_err) = self.printer.end_document().await {
                        warn!(error = %close_err, "Close after failure");
                        if self.printer.delivers_on_close() {
                            written = 0;
                        }
                    }
                    return Err(PrintError::PrintFailure {
                        written,
                        source: Box::new(e),
                    });
                }
            }
        }

        if let Err(e) = self.printer.end_document().await {
            let written = if self.printer.delivers_on_close() {
                0
            } else {
                report.delivered()
            };
            return Err(PrintError::PrintFailure {
                written,
                source: Box::new(e),
            });
        }

        info!(
            written = report.lines_written,
            controls = report.controls,
            skipped = report.skipped,
            "Print job finished"
        );
        Ok(report)
    }
}

impl RawDeviceJob {
    pub fn from_profile(profile: &PrinterProfile) -> PrintResult<Self> {
        let transport = RawTransport::for_address(&profile.share_name, profile.timeout())?;
        Ok(Self::new(
            EscPosPrinter::from_profile(transport, profile),
            profile.chars_per_line,
        ))
    }
}

/// Job for any printer class
#[derive(Debug)]
pub enum AnyPrintJob {
    RawDevice(RawDeviceJob),
    GenericQueue(GenericQueueJob),
    FileSink(FileSinkJob),
    DebugSink(DebugSinkJob),
}

fn is_file_path(name: &str) -> bool {
    name.starts_with('/') || name.starts_with("./") || name.get(1..3) == Some(":\\")
}

impl AnyPrintJob {
    /// Pick the job variant for a profile's printer class
    ///
    /// A `Text` printer whose share name is a file path writes to that file.
    pub fn for_profile(profile: &PrinterProfile) -> PrintResult<Self> {
        profile.validate()?;
        let width = profile.chars_per_line;
        let timeout = profile.timeout();

        let job = match profile.printer_class {
            PrinterClass::Text if is_file_path(&profile.share_name) => AnyPrintJob::FileSink(
                PrintJob::new(FilePrinter::file(&profile.share_name, timeout), width),
            ),
            PrinterClass::Text => AnyPrintJob::GenericQueue(PrintJob::new(
                QueuePrinter::queue(&profile.share_name, TextMarkup::Plain, timeout),
                width,
            )),
            PrinterClass::Html => AnyPrintJob::GenericQueue(PrintJob::new(
                QueuePrinter::queue(&profile.share_name, TextMarkup::Html, timeout),
                width,
            )),
            PrinterClass::Demo => {
                AnyPrintJob::DebugSink(PrintJob::new(DebugPrinter::new(&profile.share_name), width))
            }
            PrinterClass::Port | PrinterClass::Slip => {
                AnyPrintJob::RawDevice(RawDeviceJob::from_profile(profile)?)
            }
        };
        Ok(job)
    }

    pub async fn print<S: AsRef<str>>(&mut self, lines: &[S]) -> PrintResult<JobReport> {
        match self {
            AnyPrintJob::RawDevice(job) => job.print(lines).await,
            AnyPrintJob::GenericQueue(job) => job.print(lines).await,
            AnyPrintJob::FileSink(job) => job.print(lines).await,
            AnyPrintJob::DebugSink(job) => job.print(lines).await,
        }
    }

    pub async fn print_document(&mut self, document: &FormattedDocument) -> PrintResult<JobReport> {
        match self {
            AnyPrintJob::RawDevice(job) => job.print_document(document).await,
            AnyPrintJob::GenericQueue(job) => job.print_document(document).await,
            AnyPrintJob::FileSink(job) => job.print_document(document).await,
            AnyPrintJob::DebugSink(job) => job.print_document(document).await,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AnyPrintJob::RawDevice(_) => "raw-device",
            AnyPrintJob::GenericQueue(_) => "generic-queue",
            AnyPrintJob::FileSink(_) => "file-sink",
            AnyPrintJob::DebugSink(_) => "debug-sink",
        }
    }
}
