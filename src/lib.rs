// src/lib.rs
pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod probe;
pub mod session;
pub mod types;
pub mod utils;

pub use cli::Args;
pub use engine::UserFinderEngine;
pub use probe::{HttpProber, Prober};
pub use types::{Config, DetectionType, ProbeResult, ProbeStatus, ScanReport, ScanStats, Site, UserFinderError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
