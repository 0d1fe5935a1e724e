mod tcp;

pub use tcp::{TcpScan, TIMEOUT};
