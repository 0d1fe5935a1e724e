use std::{
    net::{IpAddr, SocketAddr},
    sync::{
        mpsc::{Receiver, SyncSender},
        Barrier, Mutex, PoisonError,
    },
};

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::ScanError;

use super::{OpenPort, Prober};

pub fn build(workers: usize) -> Result<ThreadPool, ScanError> {
    ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|idx| format!("prober-{}", idx))
        .build()
        .map_err(ScanError::WorkerPoolFailed)
}

/// State shared by every worker of a scan.
pub struct Worker<'a, P> {
    ip: IpAddr,
    prober: &'a P,
    queue: &'a Mutex<Receiver<u16>>,
    started: &'a Barrier,
}

impl<'a, P: Prober> Worker<'a, P> {
    pub fn new(
        ip: IpAddr,
        prober: &'a P,
        queue: &'a Mutex<Receiver<u16>>,
        started: &'a Barrier,
    ) -> Self {
        Self {
            ip,
            prober,
            queue,
            started,
        }
    }

    /// Blocks until a port is available. `None` once the queue is drained and closed.
    fn next(&self) -> Option<u16> {
        // Nothing panics while holding the lock, so a poisoned queue is still consistent.
        let queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        queue.recv().ok()
    }

    fn work(&self, results: &SyncSender<OpenPort>) {
        self.started.wait();

        while let Some(port) = self.next() {
            if !self.prober.probe(&SocketAddr::new(self.ip, port)) {
                continue;
            }
            if results.send(OpenPort::new(port)).is_err() {
                break;
            }
        }
    }
}

/// Runs one worker on every thread of `pool` and returns once all of them have exited.
///
/// `results` is the only sender of the results queue, so the queue closes exactly when it
/// is dropped here, after the broadcast has joined every worker.
pub fn run<P: Prober>(pool: &ThreadPool, worker: Worker<'_, P>, results: SyncSender<OpenPort>) {
    pool.broadcast(|_| worker.work(&results));
    drop(results);

    log::debug!(
        "All {} workers exited, results closed",
        pool.current_num_threads()
    );
}
