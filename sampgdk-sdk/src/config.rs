use std::{fs::File, io::Read, path::Path};

use anyhow::{ensure, Result};
use sampgdk_common::log::LogLevel;
use serde::{Deserialize, Serialize};

use crate::amx::MAX_CELLS;

/// Interop settings, usually read from a TOML file next to the plugin.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Cells available for staging strings, arrays and references.
    pub heap_cells: usize,

    /// Cells kept free above the heap for the VM stack.
    pub stack_cells: usize,

    /// Whether parsed format strings are reused across calls.
    pub cache_formats: bool,

    /// Records below this level are not relayed to the log sink.
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            heap_cells: 4096,
            stack_cells: 1024,
            cache_formats: true,
            log_level: LogLevel::Info,
        }
    }
}

impl Config {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = {
            let mut content = String::new();
            File::open(path)?.read_to_string(&mut content)?;

            content
        };

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        ensure!(config.heap_cells > 0, "heap_cells must be positive");
        ensure!(
            config
                .heap_cells
                .checked_add(config.stack_cells)
                .is_some_and(|cells| cells <= MAX_CELLS),
            "heap_cells + stack_cells must not exceed {} cells",
            MAX_CELLS
        );

        Ok(config)
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use super::*;

    #[test]
    fn missing_keys_use_defaults() {
        let config = Config::from_toml_str("heap_cells = 128\nlog_level = \"debug\"\n").unwrap();

        assert_eq!(config.heap_cells, 128);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.stack_cells, Config::default().stack_cells);
        assert!(config.cache_formats);
    }

    #[test]
    fn rejects_bad_configs() {
        assert!(Config::from_toml_str("heap_cells = 0").is_err());
        assert!(Config::from_toml_str("log_level = \"loud\"").is_err());
        assert!(Config::from_toml_str("heap_cells = \"many\"").is_err());
    }

    #[test]
    fn rejects_sizes_past_the_address_space() {
        assert!(Config::from_toml_str("heap_cells = 4611686018427387904").is_err());
        assert!(Config::from_toml_str("heap_cells = 536870911\nstack_cells = 1").is_err());
        assert!(Config::from_toml_str("stack_cells = 18446744073709551615").is_err());

        let config = Config::from_toml_str("heap_cells = 536870910\nstack_cells = 1").unwrap();
        assert_eq!(config.heap_cells + config.stack_cells, MAX_CELLS);
    }

    #[test]
    fn from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cache_formats = false").unwrap();

        let config = Config::from_path(file.path()).unwrap();
        assert!(!config.cache_formats);
        assert!(Config::from_path(file.path().with_extension("missing")).is_err());
    }

    #[test]
    fn serializes_back() {
        let config = Config::default();
        let text = toml::to_string(&config).unwrap();

        assert_eq!(Config::from_toml_str(&text).unwrap(), config);
    }
}
