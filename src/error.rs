use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("port range `{0}-{1}` is invalid (expected 1 <= start <= end <= 65535)")]
    InvalidRange(u16, u16),
    #[error("failed to check target kind (ensure it's a domain or an IP address)")]
    HostParseFailed(#[source] url::ParseError),
    #[error("invalid hostname `{0}`: {1}")]
    ResolverFailed(String, #[source] std::io::Error),
    #[error("resolver didn't find any address mapped by `{0}`")]
    DomainLookupFailed(String),
    #[error("failed to start the worker pool: {0}")]
    WorkerPoolFailed(#[source] rayon::ThreadPoolBuildError),
}
