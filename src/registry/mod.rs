// src/registry/mod.rs
mod client;

pub use client::{checks_url, CheckSource, RegistryClient, RegistryError, CHECKS_PATH};
