pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{http::HttpSync, memory::MemoryStorage};
pub use config::cli::LocalStorage;
pub use config::toml_config::{Settings, TomlConfig};
pub use core::tracker::{BingoTracker, Command, CommandOutcome, SlotKeys};
pub use core::weight_log::{SyncStatus, WeightLog};
pub use utils::error::{Result, TrackerError};
