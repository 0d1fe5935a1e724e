use std::fmt::{self, Display};

use crate::scan::OpenPort;

/// Open ports sorted ascending, one `<port>: <service> (open)` line each.
#[derive(Debug)]
pub struct Report {
    ports: Vec<OpenPort>,
}

impl Report {
    pub fn new(mut ports: Vec<OpenPort>) -> Self {
        ports.sort_unstable_by_key(|p| p.port);
        ports.dedup_by_key(|p| p.port);
        Self { ports }
    }

    #[inline]
    pub fn ports(&self) -> &[OpenPort] {
        &self.ports
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.ports.iter().try_for_each(|op| writeln!(f, "{}", op))
    }
}
