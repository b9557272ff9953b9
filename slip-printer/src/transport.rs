//! Byte transports for raw printers
//!
//! Supports:
//! - Network printers (TCP port 9100)
//! - Device files (`/dev/usb/lp0`, `COM1`, plain files)
//! - OS print queues (raw job via `lp` on Unix, Win32 spooler on Windows)
//! - In-memory buffer
//!
//! Every transport is opened once per document, written line by line and
//! closed at the end. Open/write/close are bounded by the profile timeout.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, info, instrument};

use crate::error::{PrintError, PrintResult};
use crate::queue::{self, QueueFormat};

/// Trait for printer byte transports
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Acquire the device, connection or queue handle
    async fn open(&mut self) -> PrintResult<()>;

    /// Send bytes; only valid while open
    async fn write(&mut self, data: &[u8]) -> PrintResult<()>;

    /// Flush and release the handle. Closing a closed transport is a no-op.
    async fn close(&mut self) -> PrintResult<()>;

    /// Human readable destination, for logs
    fn describe(&self) -> String;

    /// Whether written bytes are held back and only delivered by `close`
    fn buffers_until_close(&self) -> bool {
        false
    }
}

async fn with_timeout<T>(
    timeout: Duration,
    what: &str,
    fut: impl Future<Output = PrintResult<T>>,
) -> PrintResult<T> {
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| PrintError::Timeout(format!("{} after {:?}", what, timeout)))?
}

fn not_open(target: &str) -> PrintError {
    PrintError::InvalidState(format!("transport not open: {}", target))
}

// ============================================================================
// Network
// ============================================================================

/// Network printer (TCP port 9100)
///
/// Most thermal printers support raw TCP printing on port 9100.
#[derive(Debug)]
pub struct NetworkTransport {
    addr: String,
    timeout: Duration,
    stream: Option<TcpStream>,
}

impl NetworkTransport {
    /// Create a transport for `host` on `port`
    pub fn new(host: &str, port: u16) -> PrintResult<Self> {
        if host.trim().is_empty() {
            return Err(PrintError::InvalidConfig("empty printer host".to_string()));
        }
        Ok(Self {
            addr: format!("{}:{}", host, port),
            timeout: Duration::from_secs(5),
            stream: None,
        })
    }

    /// Create from an address string (e.g., "192.168.1.100:9100")
    pub fn from_addr(addr: &str) -> PrintResult<Self> {
        let (host, port) = split_host_port(addr)
            .ok_or_else(|| PrintError::InvalidConfig(format!("Invalid address: {}", addr)))?;
        Self::new(host, port)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

impl Transport for NetworkTransport {
    #[instrument(skip(self), fields(addr = %self.addr))]
    async fn open(&mut self) -> PrintResult<()> {
        if self.stream.is_some() {
            return Ok(());
        }
        info!("Connecting to printer");
        let addr = self.addr.clone();
        let stream = with_timeout(self.timeout, "connect", async move {
            TcpStream::connect(addr.as_str())
                .await
                .map_err(|e| PrintError::Connection(format!("{}: {}", addr, e)))
        })
        .await?;
        self.stream = Some(stream);
        Ok(())
    }

    async fn write(&mut self, data: &[u8]) -> PrintResult<()> {
        let timeout = self.timeout;
        let stream = self.stream.as_mut().ok_or_else(|| not_open(&self.addr))?;
        with_timeout(timeout, "write", async {
            stream
                .write_all(data)
                .await
                .map_err(|e| PrintError::TransportWrite(e.to_string()))
        })
        .await
    }

    #[instrument(skip(self), fields(addr = %self.addr))]
    async fn close(&mut self) -> PrintResult<()> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };
        with_timeout(self.timeout, "close", async move {
            stream.flush().await?;
            stream.shutdown().await?;
            Ok::<(), PrintError>(())
        })
        .await?;
        debug!("Connection closed");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("tcp://{}", self.addr)
    }
}

/// Split `host:port`, rejecting Windows drive paths like `C:\out.txt`
fn split_host_port(addr: &str) -> Option<(&str, u16)> {
    let (host, port) = addr.rsplit_once(':')?;
    if host.is_empty() || host.contains(['/', '\\']) {
        return None;
    }
    let port = port.parse().ok()?;
    Some((host.trim_start_matches('[').trim_end_matches(']'), port))
}

// ============================================================================
// Device / file
// ============================================================================

/// Device node, serial port or plain file
#[derive(Debug)]
pub struct DeviceTransport {
    path: PathBuf,
    create: bool,
    timeout: Duration,
    file: Option<File>,
}

impl DeviceTransport {
    /// Existing device, opened write-only
    pub fn device(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            create: false,
            timeout: Duration::from_secs(5),
            file: None,
        }
    }

    /// Regular file, created or truncated on open
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            create: true,
            ..Self::device(path)
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Transport for DeviceTransport {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn open(&mut self) -> PrintResult<()> {
        if self.file.is_some() {
            return Ok(());
        }
        let mut options = OpenOptions::new();
        options.write(true);
        if self.create {
            options.create(true).truncate(true);
        }
        let path = self.path.clone();
        let file = with_timeout(self.timeout, "open", async move {
            options
                .open(&path)
                .await
                .map_err(|e| PrintError::Connection(format!("{}: {}", path.display(), e)))
        })
        .await?;
        self.file = Some(file);
        Ok(())
    }

    async fn write(&mut self, data: &[u8]) -> PrintResult<()> {
        let timeout = self.timeout;
        let target = self.path.display().to_string();
        let file = self.file.as_mut().ok_or_else(|| not_open(&target))?;
        with_timeout(timeout, "write", async {
            file.write_all(data)
                .await
                .map_err(|e| PrintError::TransportWrite(format!("{}: {}", target, e)))
        })
        .await
    }

    async fn close(&mut self) -> PrintResult<()> {
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };
        with_timeout(self.timeout, "close", async move {
            file.flush().await?;
            Ok::<(), PrintError>(())
        })
        .await
    }

    fn describe(&self) -> String {
        format!("file://{}", self.path.display())
    }
}

// ============================================================================
// Print queue (raw job)
// ============================================================================

/// Raw job for a named OS print queue
///
/// Opening checks that the queue exists. Bytes are buffered and submitted
/// as one job on close.
#[derive(Debug)]
pub struct QueueTransport {
    name: String,
    format: QueueFormat,
    timeout: Duration,
    buf: Option<Vec<u8>>,
}

impl QueueTransport {
    pub fn new(name: impl Into<String>, format: QueueFormat) -> Self {
        Self {
            name: name.into(),
            format,
            timeout: Duration::from_secs(5),
            buf: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Transport for QueueTransport {
    #[instrument(skip(self), fields(queue = %self.name))]
    async fn open(&mut self) -> PrintResult<()> {
        if self.buf.is_some() {
            return Ok(());
        }
        with_timeout(self.timeout, "queue lookup", queue::check_queue(&self.name)).await?;
        self.buf = Some(Vec::new());
        Ok(())
    }

    async fn write(&mut self, data: &[u8]) -> PrintResult<()> {
        let buf = self.buf.as_mut().ok_or_else(|| not_open(&self.name))?;
        buf.extend_from_slice(data);
        Ok(())
    }

    #[instrument(skip(self), fields(queue = %self.name))]
    async fn close(&mut self) -> PrintResult<()> {
        let Some(data) = self.buf.take() else {
            return Ok(());
        };
        if data.is_empty() {
            return Ok(());
        }
        with_timeout(
            self.timeout,
            "queue submit",
            queue::submit(&self.name, &data, self.format),
        )
        .await
    }

    fn describe(&self) -> String {
        format!("queue://{}", self.name)
    }

    fn buffers_until_close(&self) -> bool {
        true
    }
}

// ============================================================================
// Memory
// ============================================================================

/// Collects everything written; used for previews and tests
#[derive(Debug, Default)]
pub struct MemoryTransport {
    data: Vec<u8>,
    open: bool,
    opens: usize,
    closes: usize,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Number of (open, close) calls that took effect
    pub fn cycles(&self) -> (usize, usize) {
        (self.opens, self.closes)
    }
}

impl Transport for MemoryTransport {
    async fn open(&mut self) -> PrintResult<()> {
        if !self.open {
            self.open = true;
            self.opens += 1;
        }
        Ok(())
    }

    async fn write(&mut self, data: &[u8]) -> PrintResult<()> {
        if !self.open {
            return Err(not_open("memory"));
        }
        self.data.extend_from_slice(data);
        Ok(())
    }

    async fn close(&mut self) -> PrintResult<()> {
        if self.open {
            self.open = false;
            self.closes += 1;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

// ============================================================================
// Address-selected transport
// ============================================================================

/// Transport chosen from a profile's share name
#[derive(Debug)]
pub enum RawTransport {
    Network(NetworkTransport),
    Device(DeviceTransport),
    Queue(QueueTransport),
    #[cfg(windows)]
    Spooler(crate::spooler::SpoolerTransport),
}

impl RawTransport {
    /// Pick a transport for `share_name`
    ///
    /// - `host:port` → TCP
    /// - absolute path, `./…`, `COMn`, `LPTn` → device file
    /// - anything else → print queue of that name
    pub fn for_address(share_name: &str, timeout: Duration) -> PrintResult<Self> {
        let share_name = share_name.trim();
        if share_name.is_empty() {
            return Err(PrintError::InvalidConfig("empty share name".to_string()));
        }

        if split_host_port(share_name).is_some() {
            return Ok(RawTransport::Network(
                NetworkTransport::from_addr(share_name)?.with_timeout(timeout),
            ));
        }

        if is_device_path(share_name) {
            return Ok(RawTransport::Device(
                DeviceTransport::device(share_name).with_timeout(timeout),
            ));
        }

        Ok(named_queue(share_name, timeout))
    }
}

#[cfg(windows)]
fn named_queue(name: &str, _timeout: Duration) -> RawTransport {
    RawTransport::Spooler(crate::spooler::SpoolerTransport::new(name))
}

#[cfg(not(windows))]
fn named_queue(name: &str, timeout: Duration) -> RawTransport {
    RawTransport::Queue(QueueTransport::new(name, QueueFormat::Raw).with_timeout(timeout))
}

fn is_device_path(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    let port_like = |prefix: &str| {
        upper.strip_prefix(prefix).is_some_and(|n| {
            !n.is_empty() && n.trim_end_matches(':').chars().all(|c| c.is_ascii_digit())
        })
    };
    name.starts_with('/')
        || name.starts_with("./")
        || name.starts_with("\\\\.\\")
        || name.get(1..3) == Some(":\\")
        || port_like("COM")
        || port_like("LPT")
}

impl Transport for RawTransport {
    async fn open(&mut self) -> PrintResult<()> {
        match self {
            RawTransport::Network(t) => t.open().await,
            RawTransport::Device(t) => t.open().await,
            RawTransport::Queue(t) => t.open().await,
            #[cfg(windows)]
            RawTransport::Spooler(t) => t.open().await,
        }
    }

    async fn write(&mut self, data: &[u8]) -> PrintResult<()> {
        match self {
            RawTransport::Network(t) => t.write(data).await,
            RawTransport::Device(t) => t.write(data).await,
            RawTransport::Queue(t) => t.write(data).await,
            #[cfg(windows)]
            RawTransport::Spooler(t) => t.write(data).await,
        }
    }

    async fn close(&mut self) -> PrintResult<()> {
        match self {
            RawTransport::Network(t) => t.close().await,
            RawTransport::Device(t) => t.close().await,
            RawTransport::Queue(t) => t.close().await,
            #[cfg(windows)]
            RawTransport::Spooler(t) => t.close().await,
        }
    }

    fn describe(&self) -> String {
        match self {
            RawTransport::Network(t) => t.describe(),
            RawTransport::Device(t) => t.describe(),
            RawTransport::Queue(t) => t.describe(),
            #[cfg(windows)]
            RawTransport::Spooler(t) => t.describe(),
        }
    }

    fn buffers_until_close(&self) -> bool {
        match self {
            RawTransport::Network(t) => t.buffers_until_close(),
            RawTransport::Device(t) => t.buffers_until_close(),
            RawTransport::Queue(t) => t.buffers_until_close(),
            #[cfg(windows)]
            RawTransport::Spooler(t) => t.buffers_until_close(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_transport_new() {
        let t = NetworkTransport::new("192.168.1.100", 9100).unwrap();
        assert_eq!(t.addr(), "192.168.1.100:9100");
    }

    #[test]
    fn test_invalid_addr() {
        assert!(NetworkTransport::from_addr("invalid").is_err());
        assert!(NetworkTransport::from_addr("host:notaport").is_err());
    }

    #[test]
    fn test_address_selection() {
        let timeout = Duration::from_secs(1);
        assert!(matches!(
            RawTransport::for_address("10.0.0.5:9100", timeout).unwrap(),
            RawTransport::Network(_)
        ));
        assert!(matches!(
            RawTransport::for_address("printer.local:9100", timeout).unwrap(),
            RawTransport::Network(_)
        ));
        assert!(matches!(
            RawTransport::for_address("/dev/usb/lp0", timeout).unwrap(),
            RawTransport::Device(_)
        ));
        assert!(matches!(
            RawTransport::for_address("COM3", timeout).unwrap(),
            RawTransport::Device(_)
        ));
        assert!(matches!(
            RawTransport::for_address("C:\\out\\receipt.prn", timeout).unwrap(),
            RawTransport::Device(_)
        ));
        assert!(RawTransport::for_address("  ", timeout).is_err());
    }

    #[cfg(not(windows))]
    #[test]
    fn test_queue_name_selects_queue() {
        assert!(matches!(
            RawTransport::for_address("Kitchen", Duration::from_secs(1)).unwrap(),
            RawTransport::Queue(_)
        ));
    }

    #[tokio::test]
    async fn test_memory_transport_cycle() {
        let mut t = MemoryTransport::new();
        assert!(t.write(b"x").await.is_err());
        t.open().await.unwrap();
        t.write(b"abc").await.unwrap();
        t.close().await.unwrap();
        t.close().await.unwrap();
        assert_eq!(t.data(), b"abc");
        assert_eq!(t.cycles(), (1, 1));
    }

    #[tokio::test]
    async fn test_device_transport_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.prn");

        let mut t = DeviceTransport::file(&path);
        t.open().await.unwrap();
        t.write(b"hello\n").await.unwrap();
        t.close().await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"hello\n");
    }

    #[tokio::test]
    async fn test_missing_device_is_connection_error() {
        let mut t = DeviceTransport::device("/nonexistent/dir/lp0");
        assert!(matches!(t.open().await, Err(PrintError::Connection(_))));
    }

    #[tokio::test]
    async fn test_write_to_stalled_printer_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // accept and never read
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let mut t = NetworkTransport::from_addr(&addr.to_string())
            .unwrap()
            .with_timeout(Duration::from_millis(200));
        t.open().await.unwrap();

        let payload = vec![b'x'; 32 * 1024 * 1024];
        let err = t.write(&payload).await.unwrap_err();
        assert!(matches!(err, PrintError::Timeout(_)), "{err:?}");
        t.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_queue_is_connection_error() {
        let mut t = QueueTransport::new("slip-printer-missing-queue", QueueFormat::Text)
            .with_timeout(Duration::from_secs(5));
        assert!(matches!(t.open().await, Err(PrintError::Connection(_))));
        assert!(t.write(b"x").await.is_err());
    }

    #[test]
    fn test_only_queues_buffer_until_close() {
        let timeout = Duration::from_secs(1);
        assert!(QueueTransport::new("Kitchen", QueueFormat::Raw).buffers_until_close());
        assert!(!MemoryTransport::new().buffers_until_close());
        assert!(
            !RawTransport::for_address("10.0.0.5:9100", timeout)
                .unwrap()
                .buffers_until_close()
        );
    }

    #[tokio::test]
    async fn test_unreachable_network_printer() {
        // Port 9 on localhost: refused, or times out quickly
        let mut t = NetworkTransport::new("127.0.0.1", 9)
            .unwrap()
            .with_timeout(Duration::from_millis(300));
        assert!(matches!(
            t.open().await,
            Err(PrintError::Connection(_)) | Err(PrintError::Timeout(_))
        ));
    }
}
