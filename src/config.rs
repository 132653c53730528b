//! Runtime configuration from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_DATA_DIR: &str = ".caption-studio";
const DEFAULT_NAMESPACE: &str = "slideshow-gen";
const DEFAULT_AUTOSAVE_DEBOUNCE_MS: u64 = 250;

/// Parse `key` from the environment, falling back to `default` when the
/// variable is missing or does not parse.
pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Studio settings. CLI flags override these after loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudioConfig {
    /// Root directory for snapshots and assets.
    pub data_dir: PathBuf,
    /// Key prefix for snapshots and the current-project pointer.
    pub namespace: String,
    /// Quiet period before a snapshot write.
    pub autosave_debounce: Duration,
    /// TrueType/OpenType font used to rasterize text on export.
    pub font_path: Option<PathBuf>,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            namespace: DEFAULT_NAMESPACE.to_owned(),
            autosave_debounce: Duration::from_millis(DEFAULT_AUTOSAVE_DEBOUNCE_MS),
            font_path: None,
        }
    }
}

impl StudioConfig {
    /// Read `STUDIO_DATA_DIR`, `STUDIO_NAMESPACE`, `AUTOSAVE_DEBOUNCE_MS`, and
    /// `STUDIO_FONT_PATH`.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            data_dir: env_parse("STUDIO_DATA_DIR", defaults.data_dir),
            namespace: env_parse("STUDIO_NAMESPACE", defaults.namespace),
            autosave_debounce: Duration::from_millis(env_parse("AUTOSAVE_DEBOUNCE_MS", DEFAULT_AUTOSAVE_DEBOUNCE_MS)),
            font_path: std::env::var_os("STUDIO_FONT_PATH").map(PathBuf::from),
        }
    }

    #[must_use]
    pub fn snapshot_dir(&self) -> PathBuf {
        self.data_dir.join("snapshots")
    }

    #[must_use]
    pub fn asset_dir(&self) -> PathBuf {
        self.data_dir.join("assets")
    }
}
