//! Running the shuttle computations against a store: configuration, one-shot
//! reports, export and a periodic refresh loop. The `shuttle` binary is a thin
//! CLI over these pieces.

pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod refresh;
pub mod report;

pub use config::{resolve_config, ConfigError, EngineConfig, TuningArgs};
pub use error::ServiceError;
pub use refresh::{run_refresh_loop, RefreshPolicy, RefreshSummary, RefreshTrigger};
pub use report::{compute_report, SnapshotReport};
