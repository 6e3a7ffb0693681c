pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod ids;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;

pub use error::{AppError, AppResult};
