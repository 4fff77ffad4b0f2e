/// Database configuration and connection management
pub mod database;

/// Pricing seed configuration loading from config.toml
pub mod pricing;
