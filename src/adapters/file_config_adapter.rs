//! INI file configuration adapter.

use crate::domain::settings::{DEFAULT_API_HOST, DEFAULT_MIN_INTERVAL_MS, PLACEHOLDER_API_KEY};
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::fs;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    /// Loads `path`, first writing a default file with a placeholder API key
    /// when none exists. Returns whether the file was created.
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> std::io::Result<(Self, bool)> {
        let path = path.as_ref();
        let created = if path.exists() {
            false
        } else {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, default_config())?;
            true
        };
        Ok((Self::from_file(path)?, created))
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

pub fn default_config() -> String {
    format!(
        "[api]\n\
         api_key = {PLACEHOLDER_API_KEY}\n\
         host = {DEFAULT_API_HOST}\n\
         min_interval_ms = {DEFAULT_MIN_INTERVAL_MS}\n\
         offline = false\n\
         \n\
         [screen]\n\
         years = 10\n\
         min_growth = 0.2\n\
         min_snr = 1.5\n"
    )
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_f64(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_u64(&self, section: &str, key: &str, default: u64) -> u64 {
        self.config
            .getuint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_deref()
            .and_then(Self::parse_bool)
            .unwrap_or(default)
    }
}
