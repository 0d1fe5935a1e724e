use std::collections::HashMap;

use once_cell::sync::Lazy;

pub static SERVICES: Lazy<HashMap<u16, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (20, "FTP Data"),
        (21, "FTP Control"),
        (22, "SSH/SCP"),
        (23, "Telnet"),
        (25, "SMTP"),
        (53, "DNS"),
        (80, "HTTP"),
        (110, "POP3"),
        (143, "IMAP"),
        (443, "HTTPS"),
        (3306, "MySQL"),
        (3389, "RDP"),
        (5432, "PostgreSQL"),
        (8080, "HTTP Alt"),
        (8443, "HTTPS Alt"),
    ])
});

/// Well-known service label for `port`, if there is one.
#[inline]
pub fn lookup(port: u16) -> Option<&'static str> {
    SERVICES.get(&port).copied()
}

#[cfg(test)]
mod tests {
    use super::lookup;

    #[test]
    fn known_services() {
        assert_eq!(lookup(22), Some("SSH/SCP"));
        assert_eq!(lookup(80), Some("HTTP"));
        assert_eq!(lookup(5432), Some("PostgreSQL"));
        assert_eq!(lookup(8443), Some("HTTPS Alt"));
    }

    #[test]
    fn unmapped_port() {
        assert_eq!(lookup(9999), None);
        assert_eq!(lookup(0), None);
    }
}
