pub mod findings;
pub mod orchestrator;
pub mod progress;
pub mod recommend;
pub mod summary;

pub use findings::Findings;
pub use orchestrator::{DEFAULT_ANALYSIS_PAUSE, Orchestrator};
pub use progress::{NoProgress, ProgressObserver, StepLog};
pub use recommend::{FALLBACK_RECOMMENDATION, generate_recommendations};
pub use summary::{INSUFFICIENT_DATA_SUMMARY, generate_summary};
