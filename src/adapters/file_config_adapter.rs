//! INI file configuration adapter.

use crate::domain::error::StonkError;
use crate::domain::settings::Settings;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StonkError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| StonkError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, StonkError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| StonkError::ConfigParse {
                file: "<string>".into(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Load settings from an INI file. A missing or unreadable file yields the
/// defaults.
pub fn load_settings(path: &Path) -> Settings {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "config file not found, using defaults");
        return Settings::default();
    }
    match FileConfigAdapter::from_file(path) {
        Ok(config) => Settings::from_config(&config),
        Err(e) => {
            tracing::warn!("{e}; using defaults");
            Settings::default()
        }
    }
}
