//! Configuration file loading for finsight
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `--config <path>` specified file
//! 2. Project root: `./finsight.toml` or `./.finsight.toml`
//! 3. XDG config: `$XDG_CONFIG_HOME/finsight/config.toml`
//! 4. Fallback: `~/.config/finsight/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{BackendConfig, ConfigValidationError, FileConfig};
pub use loader::ConfigLoader;
