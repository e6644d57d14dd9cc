pub mod app_config;
pub mod constants;
pub mod helpers;
pub mod logging;

pub use app_config::{AppConfig, FailurePolicy, Intervals, Timeouts};
pub use helpers::*;
