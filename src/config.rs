use log::LevelFilter;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_MAX_ROWS: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Rows the UI may use, header included.
    pub max_rows: usize,
    pub show_hidden: bool,
    pub log_file: Option<PathBuf>,
    pub log_level: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            show_hidden: false,
            log_file: None,
            log_level: LevelFilter::Debug,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct TomlConfig {
    max_rows: Option<usize>,
    show_hidden: Option<bool>,
    log_file: Option<PathBuf>,
    log_level: Option<String>,
}

impl Config {
    pub fn load() -> Self {
        let mut config = Self::config_file_path()
            .and_then(|path| fs::read_to_string(path).ok())
            .map(|contents| Self::parse(&contents))
            .unwrap_or_default();

        if let Some(path) = env::var_os("BROWSE_LOG").filter(|p| !p.is_empty()) {
            config.log_file = Some(PathBuf::from(path));
        }
        config
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("browse").join("config.toml"))
    }

    /// Malformed files fall back to the defaults.
    pub fn parse(contents: &str) -> Self {
        toml::from_str::<TomlConfig>(contents)
            .map(Self::from_toml)
            .unwrap_or_default()
    }

    fn from_toml(toml: TomlConfig) -> Self {
        let default = Self::default();
        Self {
            max_rows: toml.max_rows.filter(|&n| n > 1).unwrap_or(default.max_rows),
            show_hidden: toml.show_hidden.unwrap_or(default.show_hidden),
            log_file: toml.log_file,
            log_level: toml
                .log_level
                .as_deref()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(default.log_level),
        }
    }
}
