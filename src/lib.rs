pub mod config;
pub mod core;
pub mod domain;
pub mod scope;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{cli::LocalStorage, CliConfig};

pub use config::toml_config::TomlConfig;
pub use core::{engine::SiteEngine, pipeline::PostPipeline};
pub use scope::{guard, BuildLock, ScopeGuard, StagedWrite};
pub use utils::error::{PressError, Result};
