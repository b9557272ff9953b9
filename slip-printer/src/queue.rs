//! Generic OS print queue submission
//!
//! Unix hands the document to CUPS through `lp`, Windows writes it to the
//! spooler.

use tracing::{debug, info, instrument};

use crate::error::{PrintError, PrintResult};

/// Content type of a submitted document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueFormat {
    /// Printer-native bytes, passed through untouched
    Raw,
    Text,
    Html,
}

impl QueueFormat {
    #[cfg(not(windows))]
    fn lp_options(self) -> &'static [&'static str] {
        match self {
            QueueFormat::Raw => &["-o", "raw"],
            QueueFormat::Text => &[],
            QueueFormat::Html => &["-o", "document-format=text/html"],
        }
    }
}

/// Check that the queue `name` exists
#[cfg(not(windows))]
#[instrument]
pub async fn check_queue(name: &str) -> PrintResult<()> {
    use std::process::Stdio;
    use tokio::process::Command;

    let output = Command::new("lpstat")
        .arg("-p")
        .arg(name)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| PrintError::Connection(format!("lpstat: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PrintError::Connection(format!(
            "queue {} not available: {}",
            name,
            stderr.trim()
        )));
    }
    debug!(queue = name, "Queue found");
    Ok(())
}

/// Submit one document to the queue `name`
#[cfg(not(windows))]
#[instrument(skip(data), fields(bytes = data.len()))]
pub async fn submit(name: &str, data: &[u8], format: QueueFormat) -> PrintResult<()> {
    use std::process::Stdio;
    use tokio::io::AsyncWriteExt;
    use tokio::process::Command;

    let mut child = Command::new("lp")
        .arg("-d")
        .arg(name)
        .args(format.lp_options())
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| PrintError::Connection(format!("lp: {}", e)))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(data)
            .await
            .map_err(|e| PrintError::TransportWrite(format!("lp: {}", e)))?;
    }

    let output = child.wait_with_output().await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PrintError::Connection(format!(
            "lp -d {} failed ({}): {}",
            name,
            output.status,
            stderr.trim()
        )));
    }

    info!(queue = name, "Document submitted");
    Ok(())
}

/// Check that the printer `name` is installed
#[cfg(windows)]
#[instrument]
pub async fn check_queue(name: &str) -> PrintResult<()> {
    let name = name.to_string();
    tokio::task::spawn_blocking(move || crate::spooler::check_printer(&name))
        .await
        .map_err(|e| PrintError::WindowsPrinter(format!("Task join failed: {}", e)))??;
    debug!("Printer found");
    Ok(())
}

/// Submit one document to the queue `name`
#[cfg(windows)]
#[instrument(skip(data), fields(bytes = data.len()))]
pub async fn submit(name: &str, data: &[u8], format: QueueFormat) -> PrintResult<()> {
    let datatype = match format {
        QueueFormat::Raw => "RAW",
        QueueFormat::Text | QueueFormat::Html => "TEXT",
    };
    let name = name.to_string();
    let data = data.to_vec();

    tokio::task::spawn_blocking(move || {
        crate::spooler::submit_document(&name, "Slip Document", datatype, &data)
    })
    .await
    .map_err(|e| PrintError::WindowsPrinter(format!("Task join failed: {}", e)))??;

    info!("Document submitted");
    Ok(())
}
