use std::{
    fmt::{self, Display},
    net::{IpAddr, SocketAddr},
    ops::RangeInclusive,
    sync::{mpsc, Barrier, Mutex},
    thread,
    time::{Duration, Instant},
};

use crate::error::ScanError;

mod collect;
mod dispatch;
mod method;
mod pool;
pub mod port;

pub use method::{TcpScan, TIMEOUT};

pub const DEFAULT_WORKERS: usize = 100;
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;
/// Upper bound for [`Scanner::workers`], below rayon's own thread cap.
pub const MAX_WORKERS: usize = 4096;

/// Decides whether a single address accepts connections.
///
/// Implementations must swallow every failure and report it as `false`.
pub trait Prober: Sync {
    fn probe(&self, addr: &SocketAddr) -> bool;
}

impl<F> Prober for F
where
    F: Fn(&SocketAddr) -> bool + Sync,
{
    fn probe(&self, addr: &SocketAddr) -> bool {
        self(addr)
    }
}

/// Inclusive range of ports, `1 <= start <= end <= 65535`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    start: u16,
    end: u16,
}

impl PortRange {
    pub const WELL_KNOWN: PortRange = PortRange { start: 1, end: 1024 };
    pub const FULL: PortRange = PortRange {
        start: 1,
        end: u16::MAX,
    };

    pub fn new(start: u16, end: u16) -> Result<Self, ScanError> {
        if start == 0 || start > end {
            return Err(ScanError::InvalidRange(start, end));
        }
        Ok(Self { start, end })
    }

    /// `full` or `true` selects every port, anything else the well-known ones.
    pub fn select(mode: Option<&str>) -> Self {
        match mode {
            Some("full") | Some("true") => Self::FULL,
            _ => Self::WELL_KNOWN,
        }
    }

    #[inline]
    pub fn start(&self) -> u16 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> u16 {
        self.end
    }

    #[inline]
    pub fn iter(&self) -> RangeInclusive<u16> {
        self.start..=self.end
    }

    #[inline]
    pub fn len(&self) -> usize {
        usize::from(self.end - self.start) + 1
    }

    #[inline]
    pub fn contains(&self, port: u16) -> bool {
        self.iter().contains(&port)
    }
}

impl Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenPort {
    pub port: u16,
    pub service: Option<&'static str>,
}

impl OpenPort {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            service: port::lookup(port),
        }
    }
}

impl Display for OpenPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (open)",
            self.port,
            self.service.unwrap_or("unknown")
        )
    }
}

/// Open ports in arrival order.
#[derive(Debug)]
pub struct ScanResult {
    pub elapsed: Duration,
    pub ports: Vec<OpenPort>,
}

impl ScanResult {
    #[inline]
    fn new(elapsed: Duration, ports: Vec<OpenPort>) -> Self {
        Self { elapsed, ports }
    }
}

pub struct Scanner<P = TcpScan> {
    ip: IpAddr,
    range: PortRange,
    prober: P,
    workers: usize,
    capacity: usize,
}

impl Scanner<TcpScan> {
    pub fn new(ip: IpAddr, range: PortRange) -> Self {
        Self::with_prober(ip, range, TcpScan::default())
    }
}

impl<P: Prober> Scanner<P> {
    pub fn with_prober(ip: IpAddr, range: PortRange, prober: P) -> Self {
        Self {
            ip,
            range,
            prober,
            workers: DEFAULT_WORKERS,
            capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// Number of concurrent probers, clamped to `1..=MAX_WORKERS`.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.clamp(1, MAX_WORKERS);
        self
    }

    /// Capacity of both the work and the results queue. Zero is bumped to one.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Probes every port of the range and blocks until all results are in.
    pub fn start(&self) -> Result<ScanResult, ScanError> {
        let pool = pool::build(self.workers)?;
        let workers = pool.current_num_threads();

        let (work_tx, work_rx) = mpsc::sync_channel::<u16>(self.capacity);
        let (results_tx, results_rx) = mpsc::sync_channel::<OpenPort>(self.capacity);
        let queue = Mutex::new(work_rx);
        // Every pool thread runs a worker, plus the dispatcher.
        let started = Barrier::new(workers + 1);

        log::debug!(
            "Scanning ports {} on `{}` with {} workers (queue capacity {})",
            self.range,
            self.ip,
            workers,
            self.capacity
        );

        let now = Instant::now();
        let ports = thread::scope(|s| {
            let started = &started;
            let worker = pool::Worker::new(self.ip, &self.prober, &queue, started);
            let range = self.range;

            s.spawn(move || pool::run(&pool, worker, results_tx));
            s.spawn(move || dispatch::feed(range, work_tx, started));

            collect::drain(results_rx)
        });
        let elapsed = now.elapsed();

        log::debug!(
            "Scan finished in {:.4}s, {} open port(s)",
            elapsed.as_secs_f32(),
            ports.len()
        );

        Ok(ScanResult::new(elapsed, ports))
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashSet,
        net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener},
        sync::atomic::{AtomicUsize, Ordering},
        thread,
        time::Duration,
    };

    use super::{OpenPort, PortRange, Scanner, DEFAULT_WORKERS, MAX_WORKERS};
    use crate::error::ScanError;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    fn open_ports(ports: &[OpenPort]) -> HashSet<u16> {
        ports.iter().map(|p| p.port).collect()
    }

    #[test]
    fn range_bounds() {
        assert!(PortRange::new(1, 1).is_ok());
        assert!(PortRange::new(1, 65535).is_ok());
        assert!(matches!(
            PortRange::new(0, 10),
            Err(ScanError::InvalidRange(0, 10))
        ));
        assert!(matches!(
            PortRange::new(20, 10),
            Err(ScanError::InvalidRange(20, 10))
        ));
    }

    #[test]
    fn range_len() {
        assert_eq!(PortRange::WELL_KNOWN.len(), 1024);
        assert_eq!(PortRange::FULL.len(), 65535);
        assert_eq!(PortRange::new(7, 7).unwrap().len(), 1);
    }

    #[test]
    fn select_well_known_range() {
        for mode in [None, Some("quick"), Some("FULL"), Some("")] {
            let range = PortRange::select(mode);
            assert_eq!((range.start(), range.end()), (1, 1024));
            assert!(range.contains(1));
            assert!(range.contains(1024));
            assert!(!range.contains(1025));
            assert!(!range.contains(65535));
        }
    }

    #[test]
    fn select_full_range() {
        for mode in ["full", "true"] {
            let range = PortRange::select(Some(mode));
            assert_eq!((range.start(), range.end()), (1, 65535));
            assert!(range.contains(1));
            assert!(range.contains(1024));
            assert!(range.contains(1025));
            assert!(range.contains(65535));
        }
    }

    #[test]
    fn open_port_line() {
        assert_eq!(OpenPort::new(22).to_string(), "22: SSH/SCP (open)");
        assert_eq!(OpenPort::new(9999).to_string(), "9999: unknown (open)");
    }

    #[test]
    fn single_open_port_across_runs() {
        let only_http = |addr: &SocketAddr| addr.port() == 80;
        let scanner = Scanner::with_prober(LOCALHOST, PortRange::WELL_KNOWN, only_http);

        for _ in 0..20 {
            let res = scanner.start().unwrap();
            assert_eq!(res.ports, vec![OpenPort::new(80)]);
        }
    }

    #[test]
    fn every_probed_port_is_collected_once() {
        // Uneven probe durations shuffle the arrival order.
        let slow_evens = |addr: &SocketAddr| {
            thread::sleep(Duration::from_micros(u64::from(addr.port() % 5) * 50));
            addr.port() % 2 == 0
        };
        let range = PortRange::new(1, 3000).unwrap();
        let scanner = Scanner::with_prober(LOCALHOST, range, slow_evens);

        let res = scanner.start().unwrap();
        let found = open_ports(&res.ports);

        assert_eq!(res.ports.len(), 1500);
        assert_eq!(
            found,
            range.iter().filter(|p| p % 2 == 0).collect::<HashSet<_>>()
        );
    }

    #[test]
    fn nothing_open() {
        let closed = |_: &SocketAddr| false;
        let scanner = Scanner::with_prober(LOCALHOST, PortRange::WELL_KNOWN, closed);

        assert!(scanner.start().unwrap().ports.is_empty());
    }

    #[test]
    fn more_workers_than_ports() {
        let all_open = |_: &SocketAddr| true;
        let range = PortRange::new(5, 7).unwrap();
        let scanner = Scanner::with_prober(LOCALHOST, range, all_open);

        let res = scanner.start().unwrap();
        assert_eq!(open_ports(&res.ports), HashSet::from([5, 6, 7]));
    }

    #[test]
    fn single_worker_and_tiny_queues() {
        let all_open = |_: &SocketAddr| true;
        let range = PortRange::new(1000, 1199).unwrap();
        let scanner = Scanner::with_prober(LOCALHOST, range, all_open)
            .workers(0)
            .queue_capacity(0);

        let res = scanner.start().unwrap();
        assert_eq!(open_ports(&res.ports), range.iter().collect::<HashSet<_>>());
        assert_eq!(res.ports.len(), 200);
    }

    #[test]
    fn worker_count_is_clamped() {
        let closed = |_: &SocketAddr| false;
        let scanner = Scanner::with_prober(LOCALHOST, PortRange::WELL_KNOWN, closed);
        assert_eq!(scanner.workers, DEFAULT_WORKERS);

        let scanner = scanner.workers(usize::MAX);
        assert_eq!(scanner.workers, MAX_WORKERS);

        let scanner = scanner.workers(0);
        assert_eq!(scanner.workers, 1);
    }

    #[test]
    fn in_flight_probes_never_exceed_workers() {
        let workers = 10;
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let counting = |_: &SocketAddr| {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(2));
            in_flight.fetch_sub(1, Ordering::SeqCst);
            true
        };
        let range = PortRange::new(1, 2000).unwrap();
        let scanner = Scanner::with_prober(LOCALHOST, range, counting).workers(workers);

        let res = scanner.start().unwrap();

        assert_eq!(res.ports.len(), 2000);
        assert_eq!(peak.load(Ordering::SeqCst), workers);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn scan_loopback_listener() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        let range = PortRange::new(port, port).unwrap();

        let res = Scanner::new(LOCALHOST, range).start().unwrap();
        assert_eq!(res.ports, vec![OpenPort::new(port)]);
    }

    #[test]
    fn scan_closed_loopback_port() {
        let port = {
            let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
            listener.local_addr().unwrap().port()
        };
        let range = PortRange::new(port, port).unwrap();

        let res = Scanner::new(LOCALHOST, range).start().unwrap();
        assert!(res.ports.is_empty());
    }

    #[test]
    fn repeated_scans_agree() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        let range =
            PortRange::new(port.saturating_sub(20).max(1), port.saturating_add(20)).unwrap();
        let scanner = Scanner::new(LOCALHOST, range);

        let first = open_ports(&scanner.start().unwrap().ports);
        let second = open_ports(&scanner.start().unwrap().ports);

        assert!(first.contains(&port));
        assert_eq!(first, second);
    }
}
