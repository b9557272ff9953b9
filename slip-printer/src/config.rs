//! Command-line configuration
//!
//! # Environment variables
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | PRINTER_SHARE | `demo` | `host:port`, device path, queue name or file |
//! | PRINTER_WIDTH | 48 | characters per line |
//! | PRINTER_CODE_PAGE | 1252 | code page number |
//! | PRINTER_CLASS | 4 | 1=Text 2=Html 3=Port 4=Demo other=Slip |
//! | PRINTER_TIMEOUT_MS | 5000 | transport timeout |
//! | PRINTER_CUT_ON_END | false | cut when the document closes |
//! | LOG_LEVEL | info | tracing filter for this crate |

use std::path::PathBuf;

use crate::error::PrintResult;
use crate::profile::{PrinterClass, PrinterProfile};

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Runtime configuration for `slip-print`
#[derive(Debug, Clone)]
pub struct Config {
    pub profile: PrinterProfile,
    pub log_level: String,
}

impl Config {
    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let share_name = std::env::var("PRINTER_SHARE").unwrap_or_else(|_| "demo".into());
        let class = PrinterClass::from(env_or("PRINTER_CLASS", 4i32));

        let profile = PrinterProfile {
            share_name,
            chars_per_line: env_or("PRINTER_WIDTH", 48),
            code_page: env_or("PRINTER_CODE_PAGE", 1252),
            printer_class: class,
            cut_on_end: env_or("PRINTER_CUT_ON_END", false),
            timeout_ms: env_or("PRINTER_TIMEOUT_MS", 5000),
        };

        Self {
            profile,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
        }
    }

    /// Replace the profile with one loaded from a JSON file
    pub fn with_profile_file(mut self, path: Option<&PathBuf>) -> PrintResult<Self> {
        if let Some(path) = path {
            self.profile = PrinterProfile::from_json_file(path)?;
        }
        Ok(self)
    }
}
