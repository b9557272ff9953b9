//! Windows spooler access
//!
//! Uses the Win32 API to send documents through installed printer drivers.

use core::ffi::c_void;

use tracing::{debug, info};
use windows::Win32::Graphics::Printing::{
    ClosePrinter, DOC_INFO_1W, EndDocPrinter, EndPagePrinter, OpenPrinterW, PRINTER_HANDLE,
    StartDocPrinterW, StartPagePrinter, WritePrinter,
};
use windows::core::{PCWSTR, PWSTR};

use crate::error::{PrintError, PrintResult};
use crate::transport::Transport;

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Open spooler document; ends the page and document and closes the
/// printer on drop
struct SpoolDocument {
    handle: PRINTER_HANDLE,
}

impl SpoolDocument {
    fn start(printer: &str, doc_name: &str, datatype: &str) -> PrintResult<Self> {
        let name_w = to_wide(printer);
        let doc_name_w = to_wide(doc_name);
        let datatype_w = to_wide(datatype);

        unsafe {
            let mut handle = PRINTER_HANDLE::default();
            OpenPrinterW(PCWSTR::from_raw(name_w.as_ptr()), &mut handle, None)
                .map_err(|e| PrintError::Connection(format!("OpenPrinterW {}: {}", printer, e)))?;

            let doc_info = DOC_INFO_1W {
                pDocName: PWSTR(doc_name_w.as_ptr() as *mut _),
                pOutputFile: PWSTR::null(),
                pDatatype: PWSTR(datatype_w.as_ptr() as *mut _),
            };

            if StartDocPrinterW(handle, 1, &doc_info as *const DOC_INFO_1W) == 0 {
                let _ = ClosePrinter(handle);
                return Err(PrintError::Connection(format!(
                    "StartDocPrinter failed: {}",
                    printer
                )));
            }

            if !StartPagePrinter(handle).as_bool() {
                let _ = EndDocPrinter(handle);
                let _ = ClosePrinter(handle);
                return Err(PrintError::Connection(format!(
                    "StartPagePrinter failed: {}",
                    printer
                )));
            }

            Ok(Self { handle })
        }
    }

    fn write(&mut self, data: &[u8]) -> PrintResult<()> {
        let mut written: u32 = 0;
        let ok = unsafe {
            WritePrinter(
                self.handle,
                data.as_ptr() as *const c_void,
                data.len() as u32,
                &mut written,
            )
        };
        if !ok.as_bool() {
            return Err(PrintError::TransportWrite("WritePrinter failed".to_string()));
        }
        if written != data.len() as u32 {
            return Err(PrintError::TransportWrite(format!(
                "Incomplete write: {} of {} bytes",
                written,
                data.len()
            )));
        }
        Ok(())
    }
}

impl Drop for SpoolDocument {
    fn drop(&mut self) {
        unsafe {
            let _ = EndPagePrinter(self.handle);
            let _ = EndDocPrinter(self.handle);
            let _ = ClosePrinter(self.handle);
        }
    }
}

/// Open and release the printer `name`; fails if it is not installed
pub fn check_printer(printer: &str) -> PrintResult<()> {
    let name_w = to_wide(printer);
    unsafe {
        let mut handle = PRINTER_HANDLE::default();
        OpenPrinterW(PCWSTR::from_raw(name_w.as_ptr()), &mut handle, None)
            .map_err(|e| PrintError::Connection(format!("OpenPrinterW {}: {}", printer, e)))?;
        let _ = ClosePrinter(handle);
    }
    Ok(())
}

/// Submit a complete document in one call
pub fn submit_document(
    printer: &str,
    doc_name: &str,
    datatype: &str,
    data: &[u8],
) -> PrintResult<()> {
    let mut doc = SpoolDocument::start(printer, doc_name, datatype)?;
    doc.write(data)
}

/// Raw ESC/POS job on a driver-installed printer
pub struct SpoolerTransport {
    name: String,
    doc: Option<SpoolDocument>,
}

impl std::fmt::Debug for SpoolerTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpoolerTransport")
            .field("name", &self.name)
            .field("open", &self.doc.is_some())
            .finish()
    }
}

impl SpoolerTransport {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            doc: None,
        }
    }
}

impl Transport for SpoolerTransport {
    async fn open(&mut self) -> PrintResult<()> {
        if self.doc.is_none() {
            info!(printer = %self.name, "Opening spooler document");
            self.doc = Some(SpoolDocument::start(&self.name, "Raw Document", "RAW")?);
        }
        Ok(())
    }

    async fn write(&mut self, data: &[u8]) -> PrintResult<()> {
        match self.doc.as_mut() {
            Some(doc) => doc.write(data),
            None => Err(PrintError::InvalidState(format!(
                "transport not open: {}",
                self.name
            ))),
        }
    }

    async fn close(&mut self) -> PrintResult<()> {
        if self.doc.take().is_none() {
            debug!(printer = %self.name, "Spooler document already closed");
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("spooler://{}", self.name)
    }
}
