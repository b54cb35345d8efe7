//! Index configuration.

use crate::error::{CoreError, CoreResult};

/// Schema versions this build can read.
pub const DB_VERSIONS: &[u16] = &[0];

/// Namespace the index is stored under unless configured otherwise.
pub const DEFAULT_NAMESPACE: &str = "keva";

/// Configuration for a [`KevaIndex`](crate::KevaIndex).
#[derive(Debug, Clone)]
pub struct Config {
    /// Engine namespace holding the index.
    pub namespace: String,

    /// Schema version written by this build.
    pub db_version: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            db_version: DB_VERSIONS.iter().copied().max().unwrap_or_default(),
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the engine namespace.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }
}

/// Checks a schema version found on disk against [`DB_VERSIONS`].
///
/// Used by the lifecycle code that owns version records; the index's own
/// read/write path never calls it.
///
/// # Errors
///
/// Returns [`CoreError::UnsupportedVersion`] for unknown versions.
pub fn check_db_version(found: u16) -> CoreResult<()> {
    if DB_VERSIONS.contains(&found) {
        Ok(())
    } else {
        Err(CoreError::UnsupportedVersion {
            found,
            supported: DB_VERSIONS,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.namespace, "keva");
        assert_eq!(config.db_version, 0);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new().namespace("keva-test");
        assert_eq!(config.namespace, "keva-test");
    }

    #[test]
    fn version_check() {
        assert!(check_db_version(0).is_ok());
        assert!(matches!(
            check_db_version(1),
            Err(CoreError::UnsupportedVersion { found: 1, .. })
        ));
    }
}
