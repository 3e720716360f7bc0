/// Database configuration and connection management
pub mod database;

/// Credit policy and account seeds loaded from config.toml
pub mod policy;

/// Administrator IDs from environment variables
pub mod users;
