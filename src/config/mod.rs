/// Database configuration and connection management
pub mod database;

/// Service settings from config.toml and the environment
pub mod settings;
