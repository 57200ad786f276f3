pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod source;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, AppResult};

use std::sync::Arc;
use std::time::Duration;

use source::DataSource;

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn DataSource>,
    pub analysis_pause: Duration,
}
