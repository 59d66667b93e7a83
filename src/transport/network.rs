//! # Raw TCP Transport
//!
//! Sends command bytes to a network label printer on its raw port (9100).
//!
//! Delivery is fire-and-forget: connect and write under one timeout,
//! flush, close. The printer sends no acknowledgement, so success means the
//! bytes left this host. One connection per job; nothing is pooled.
//!
//! ```no_run
//! use etiqueta::transport::NetworkPrinter;
//!
//! let printer = NetworkPrinter::resolve("192.168.1.50", 9100)?;
//! printer.send(b"^XA^FO20,20^A0N,30,30^FDHello^FS^XZ")?;
//! # Ok::<(), etiqueta::error::EtiquetaError>(())
//! ```

use std::io::Write;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{info, instrument};

use crate::error::EtiquetaError;
use crate::printer::RAW_PORT;

/// Default connect and write timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Bytes per `write` call.
const CHUNK_SIZE: usize = 4096;

/// Printer reachable over raw TCP.
#[derive(Debug, Clone)]
pub struct NetworkPrinter {
    addr: SocketAddr,
    timeout: Duration,
}

impl NetworkPrinter {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Resolve `host`, `host:port` or `ip:port`. Without a port,
    /// `default_port` is used.
    pub fn resolve(target: &str, default_port: u16) -> Result<Self, EtiquetaError> {
        let target = target.trim();
        if target.is_empty() {
            return Err(EtiquetaError::RenderTarget(
                "no printer address configured".to_string(),
            ));
        }

        if let Ok(addr) = target.parse::<SocketAddr>() {
            return Ok(Self::new(addr));
        }

        let with_port = if target.contains(':') {
            target.to_string()
        } else {
            format!("{}:{}", target, default_port)
        };
        let addr = with_port
            .to_socket_addrs()
            .map_err(|e| {
                EtiquetaError::RenderTarget(format!("Invalid printer address {}: {}", target, e))
            })?
            .next()
            .ok_or_else(|| {
                EtiquetaError::RenderTarget(format!("Printer address {} did not resolve", target))
            })?;
        Ok(Self::new(addr))
    }

    /// Resolve with the standard raw port as default.
    pub fn from_target(target: &str) -> Result<Self, EtiquetaError> {
        Self::resolve(target, RAW_PORT)
    }

    /// Set the connect and per-write timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the printer address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Connect, write `data`, flush and close.
    #[instrument(skip(self, data), fields(addr = %self.addr, data_len = data.len()))]
    pub fn send(&self, data: &[u8]) -> Result<(), EtiquetaError> {
        info!("Connecting to printer");

        let mut stream = TcpStream::connect_timeout(&self.addr, self.timeout).map_err(|e| {
            EtiquetaError::RenderTarget(format!("Could not connect to printer {}: {}", self.addr, e))
        })?;
        stream.set_write_timeout(Some(self.timeout)).map_err(|e| {
            EtiquetaError::RenderTarget(format!("Could not configure printer socket: {}", e))
        })?;

        for chunk in data.chunks(CHUNK_SIZE) {
            stream.write_all(chunk).map_err(|e| {
                EtiquetaError::RenderTarget(format!("Write to printer {} failed: {}", self.addr, e))
            })?;
        }
        stream
            .flush()
            .map_err(|e| EtiquetaError::RenderTarget(format!("Flush failed: {}", e)))?;

        info!("Print job sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_resolve_forms() {
        let p = NetworkPrinter::resolve("127.0.0.1:9200", 9100).unwrap();
        assert_eq!(p.addr().port(), 9200);
        let p = NetworkPrinter::resolve("127.0.0.1", 9100).unwrap();
        assert_eq!(p.addr().port(), 9100);
        assert!(NetworkPrinter::resolve("   ", 9100).is_err());
    }

    #[test]
    fn test_send_delivers_all_bytes() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let reader = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).unwrap();
            received
        });

        let payload: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        NetworkPrinter::new(addr).send(&payload).unwrap();
        assert_eq!(reader.join().unwrap(), payload);
    }

    #[test]
    fn test_stalled_printer_times_out() {
        // Accepted by the backlog but never read
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let payload = vec![b'^'; 64 * 1024 * 1024];
        let err = NetworkPrinter::new(addr)
            .with_timeout(Duration::from_millis(200))
            .send(&payload)
            .unwrap_err();
        assert!(err.to_string().contains("Write to printer"));
        drop(listener);
    }

    #[test]
    fn test_refused_connection_is_render_target_error() {
        // Bind then drop to get a port nothing listens on
        let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        let err = NetworkPrinter::new(addr)
            .with_timeout(Duration::from_millis(500))
            .send(b"^XA^XZ")
            .unwrap_err();
        assert!(matches!(err, EtiquetaError::RenderTarget(_)));
    }
}
