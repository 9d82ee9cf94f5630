//! Client and ingestion configuration

pub mod client_config;
pub mod null_handling;

pub use client_config::*;
pub use null_handling::*;
