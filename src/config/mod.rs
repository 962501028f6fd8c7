// src/config/mod.rs
pub mod matcher;

pub use matcher::{HostedConfig, LocalConfig, MatcherConfig};
