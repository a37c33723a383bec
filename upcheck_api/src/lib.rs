pub mod config;
pub mod constants;
pub mod error;
pub mod primitives;
pub mod report;
pub mod snapshot;
