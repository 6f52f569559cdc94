//! Data models: raw input, star-schema records and configuration.

pub mod config;
pub mod dimensions;
pub mod fact;
pub mod raw;
