//! Environment configuration (TOML).
//!
//! ```toml
//! # Suppress generic-backend keyboards while a raw keyboard is present.
//! prefer_raw_keyboards = true
//! # Same for mice.
//! prefer_raw_mice = true
//! ```
//!
//! Missing keys take their defaults.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub prefer_raw_keyboards: bool,
    pub prefer_raw_mice: bool,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            prefer_raw_keyboards: true,
            prefer_raw_mice: true,
        }
    }
}

impl EnvironmentConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_fill_missing_keys() {
        let cfg = EnvironmentConfig::from_toml_str("prefer_raw_mice = false").unwrap();
        assert!(cfg.prefer_raw_keyboards);
        assert!(!cfg.prefer_raw_mice);
        assert_eq!(EnvironmentConfig::from_toml_str("").unwrap(), EnvironmentConfig::default());
    }

    #[test]
    fn rejects_bad_types() {
        let err = EnvironmentConfig::from_toml_str("prefer_raw_mice = 3").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "prefer_raw_keyboards = false").unwrap();
        let cfg = EnvironmentConfig::load(file.path()).unwrap();
        assert!(!cfg.prefer_raw_keyboards);
        assert!(cfg.prefer_raw_mice);

        let err = EnvironmentConfig::load(file.path().with_extension("missing")).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }
}
