use std::sync::{mpsc::SyncSender, Barrier};

use super::PortRange;

/// Pushes every port of `range` into the work queue, then closes it by dropping `queue`.
///
/// Waits for all workers to be up first. A full queue blocks until a worker catches up.
pub fn feed(range: PortRange, queue: SyncSender<u16>, started: &Barrier) {
    started.wait();

    for port in range.iter() {
        // Only fails once every worker is gone.
        if queue.send(port).is_err() {
            log::debug!("Work queue closed early, stopped at port {}", port);
            return;
        }
    }

    log::debug!("Dispatched {} ports", range.len());
}
