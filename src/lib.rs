pub mod error;
pub mod logger;
pub mod report;
pub mod resolver;
pub mod scan;
