pub mod address;
pub mod config;
pub mod error;
pub mod keys;
pub mod network;
pub mod scan;
pub mod store;
pub mod web;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
