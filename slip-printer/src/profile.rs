//! Printer profile
//!
//! Loaded once per printer and shared read-only by every job that
//! targets it.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::codepage::CodePage;
use crate::error::{PrintError, PrintResult};

/// Printer family, selects the print job variant
///
/// Serialised as the integer selector: 1=Text, 2=Html, 3=Port, 4=Demo,
/// anything else=Slip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum PrinterClass {
    /// Plain text through the OS print queue
    Text,
    /// HTML document through the OS print queue
    Html,
    /// Raw bytes to a port or device
    Port,
    /// No hardware, log the output
    Demo,
    /// Receipt printer driven by ESC/POS commands
    #[default]
    Slip,
}

impl From<i32> for PrinterClass {
    fn from(value: i32) -> Self {
        match value {
            1 => PrinterClass::Text,
            2 => PrinterClass::Html,
            3 => PrinterClass::Port,
            4 => PrinterClass::Demo,
            _ => PrinterClass::Slip,
        }
    }
}

impl From<PrinterClass> for i32 {
    fn from(class: PrinterClass) -> Self {
        match class {
            PrinterClass::Text => 1,
            PrinterClass::Html => 2,
            PrinterClass::Port => 3,
            PrinterClass::Demo => 4,
            PrinterClass::Slip => 0,
        }
    }
}

/// Printer identity and paper geometry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterProfile {
    /// `host:port`, device path, queue name or output file
    pub share_name: String,
    /// Characters per line
    #[serde(default = "default_width")]
    pub chars_per_line: usize,
    #[serde(default = "default_code_page")]
    pub code_page: u16,
    #[serde(default)]
    pub printer_class: PrinterClass,
    /// Cut the paper when the document is closed
    #[serde(default)]
    pub cut_on_end: bool,
    /// Transport open/write/close timeout
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_width() -> usize {
    48
}

fn default_code_page() -> u16 {
    1252
}

fn default_timeout_ms() -> u64 {
    5000
}

impl PrinterProfile {
    /// Create a profile with default width (80mm paper), code page and timeout
    pub fn new(share_name: impl Into<String>, printer_class: PrinterClass) -> Self {
        Self {
            share_name: share_name.into(),
            chars_per_line: default_width(),
            code_page: default_code_page(),
            printer_class,
            cut_on_end: false,
            timeout_ms: default_timeout_ms(),
        }
    }

    pub fn with_width(mut self, chars_per_line: usize) -> Self {
        self.chars_per_line = chars_per_line;
        self
    }

    pub fn with_code_page(mut self, code_page: u16) -> Self {
        self.code_page = code_page;
        self
    }

    pub fn with_cut_on_end(mut self, cut_on_end: bool) -> Self {
        self.cut_on_end = cut_on_end;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn code_page(&self) -> CodePage {
        CodePage::new(self.code_page)
    }

    /// Load a profile from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> PrintResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let profile: Self = serde_json::from_str(&content).map_err(|e| {
            PrintError::InvalidConfig(format!("{}: {}", path.display(), e))
        })?;
        profile.validate()?;
        Ok(profile)
    }

    /// Reject profiles no job could use
    pub fn validate(&self) -> PrintResult<()> {
        if self.printer_class != PrinterClass::Demo && self.share_name.trim().is_empty() {
            return Err(PrintError::InvalidConfig("share_name is empty".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(PrintError::InvalidConfig("timeout_ms must be > 0".to_string()));
        }
        Ok(())
    }
}
