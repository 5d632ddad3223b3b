// src/lib.rs
pub mod aggregator;
pub mod cache;
pub mod checks;
pub mod config;
pub mod metrics;
pub mod registry;
pub mod server;
pub mod version;
