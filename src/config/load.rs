//! Configuration loading from files.
//!
//! The YAML file is layered with `FOLIO__*` environment overrides, so
//! `FOLIO__CACHE=true` turns caching on without editing the file.

use std::path::{Path, PathBuf};

use super::{ConfigError, SiteConfig};

/// Default config file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "folio.yaml";

impl SiteConfig {
    /// Load the config from the command line argument, defaulting to `folio.yaml`.
    ///
    /// Relative paths inside the config are resolved against the config
    /// file's directory.
    pub fn load_from_arg(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config_file = config_file.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
        let config_file = if config_file.is_relative() {
            std::env::current_dir()
                .map_err(ConfigError::CwdFailure)?
                .join(config_file)
        } else {
            config_file.to_path_buf()
        };

        let mut config = Self::load_from_file(&config_file)?;
        config.resolve_paths(&base_path_from_config(&config_file));
        Ok(config)
    }

    /// Load the config from a file path, without resolving relative paths.
    pub(crate) fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::Validation(format!(
                "config file not found: {}",
                path.display()
            )));
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("FOLIO").separator("__"))
            .build()?;

        let config: SiteConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.title.trim().is_empty() {
            return Err(ConfigError::Validation(
                "invalid config: 'title' must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Get the base path from a config file path (its parent directory).
pub fn base_path_from_config(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_file_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.yaml");
        std::fs::write(
            &path,
            "title: Test Site\nsubtitle: Notes\ncache: true\ncontent_path: pages\n",
        )
        .unwrap();

        let config = SiteConfig::load_from_arg(Some(&path)).unwrap();
        assert_eq!(config.title, "Test Site");
        assert_eq!(config.subtitle.as_deref(), Some("Notes"));
        assert!(config.cache);
        assert_eq!(config.content_path, dir.path().join("pages"));
        assert_eq!(config.theme_path, dir.path().join("theme"));
    }

    #[test]
    fn test_missing_file_is_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SiteConfig::load_from_file(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_empty_title_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.yaml");
        std::fs::write(&path, "title: ''\n").unwrap();
        assert!(SiteConfig::load_from_file(&path).is_err());
    }

    #[test]
    fn test_base_path_from_config() {
        assert_eq!(
            base_path_from_config(Path::new("/project/folio.yaml")),
            PathBuf::from("/project")
        );
        assert_eq!(
            base_path_from_config(Path::new("folio.yaml")),
            PathBuf::from("")
        );
    }
}
