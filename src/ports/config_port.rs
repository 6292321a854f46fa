//! Configuration access port trait.

use std::path::PathBuf;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_f64(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_u64(&self, section: &str, key: &str, default: u64) -> u64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// A path value; a leading `~/` is expanded against `home`.
    fn get_path(&self, section: &str, key: &str, home: &std::path::Path) -> Option<PathBuf> {
        let raw = self.get_string(section, key)?;
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        Some(match raw.strip_prefix("~/") {
            Some(rest) => home.join(rest),
            None => PathBuf::from(raw),
        })
    }
}
