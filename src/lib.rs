// Library modules for the binary and integration tests
pub mod audio;
pub mod auth;
pub mod cleanup;
pub mod cli;
pub mod config;
pub mod error;
pub mod keystore;
pub mod logging;
pub mod models;
pub mod rate_limit;
pub mod server;
pub mod synthesis;
pub mod utils;
