use std::sync::mpsc::Receiver;

use super::OpenPort;

/// Blocks on `results` until every sender is gone.
pub fn drain(results: Receiver<OpenPort>) -> Vec<OpenPort> {
    results.into_iter().collect()
}
