use std::{
    net::{SocketAddr, TcpStream},
    time::Duration,
};

use crate::scan::Prober;

pub const TIMEOUT: Duration = Duration::from_millis(250);

/// TCP connect probe. Any connect error, timeouts included, reads as closed.
#[derive(Debug, Clone, Copy)]
pub struct TcpScan {
    timeout: Duration,
}

impl TcpScan {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TcpScan {
    fn default() -> Self {
        Self::new(TIMEOUT)
    }
}

impl Prober for TcpScan {
    fn probe(&self, addr: &SocketAddr) -> bool {
        // The stream, if any, is dropped right away which closes the socket.
        TcpStream::connect_timeout(addr, self.timeout).is_ok()
    }
}
