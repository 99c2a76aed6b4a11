pub mod config;
pub mod constants;
pub mod expiration;
pub mod logging;
pub mod store;
pub mod validation;
pub mod workers;
