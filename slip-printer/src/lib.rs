//! # slip-printer
//!
//! Receipt/slip printer pipeline: tagged text lines in, printed slips out.
//!
//! ## Scope
//!
//! - Inline tag parsing (`<eb>`, `<cut>`, `<bmp>logo.png`, `<r>`, ...)
//! - Line alignment against the paper width
//! - ESC/POS encoding in the printer's code page
//! - Delivery to network, device, OS queue, file or debug destinations
//!
//! Business documents (tickets, orders) are rendered to tagged lines by
//! the application and handed over here.
//!
//! ## Example
//!
//! ```ignore
//! use slip_printer::{AnyPrintJob, PrinterClass, PrinterProfile};
//!
//! let profile = PrinterProfile::new("192.168.1.100:9100", PrinterClass::Slip).with_width(42);
//! let mut job = AnyPrintJob::for_profile(&profile)?;
//! job.print(&["<t>TABLE 12", "<eb>", "2x Coffee", "<db>", "<j>Total|7.00", "<cut>"]).await?;
//! ```

mod bitmap;
mod codepage;
pub mod config;
mod document;
mod encoder;
mod error;
mod escpos;
mod format;
mod job;
pub mod logger;
mod printer;
mod profile;
mod queue;
#[cfg(windows)]
mod spooler;
mod tag;
mod transport;

// Re-exports
pub use bitmap::load_raster;
pub use codepage::CodePage;
pub use document::FormattedDocument;
pub use encoder::{dispatch_line, Dispatched, DocumentState, EscPosPrinter, LinePrinter};
pub use error::{PrintError, PrintResult};
pub use escpos::{parse_raw_command, EscPosBuilder};
pub use format::{
    format, format_center, format_fill, format_justify, format_left, format_right, FormattedLine,
};
pub use job::{
    AnyPrintJob, DebugSinkJob, FileSinkJob, GenericQueueJob, JobReport, PrintJob, RawDeviceJob,
};
pub use printer::{DebugPrinter, FilePrinter, QueuePrinter, TextMarkup, TextPrinter};
pub use profile::{PrinterClass, PrinterProfile};
pub use queue::QueueFormat;
pub use tag::{parse_line, Alignment, ControlTag, FontHint, LineTag, ParsedLine, SENTINEL};
pub use transport::{
    DeviceTransport, MemoryTransport, NetworkTransport, QueueTransport, RawTransport, Transport,
};

#[cfg(windows)]
pub use spooler::SpoolerTransport;
