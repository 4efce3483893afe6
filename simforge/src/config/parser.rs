//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;

use super::defaults::{VALID_LOG_LEVELS, VALID_PLATFORMS};
use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in
/// the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [store] section
    if let Some(section) = ini.section(Some("store")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.store.directory = expand_tilde(v);
            }
        }
    }

    // [executor] section
    if let Some(section) = ini.section(Some("executor")) {
        if let Some(v) = section.get("max_concurrent_jobs") {
            let parsed: usize = v.parse().map_err(|_| ConfigFileError::InvalidValue {
                section: "executor".to_string(),
                key: "max_concurrent_jobs".to_string(),
                value: v.to_string(),
                reason: "must be a positive integer".to_string(),
            })?;
            if parsed == 0 {
                return Err(ConfigFileError::InvalidValue {
                    section: "executor".to_string(),
                    key: "max_concurrent_jobs".to_string(),
                    value: v.to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
            config.executor.max_concurrent_jobs = parsed;
        }
        if let Some(v) = section.get("chunk_size") {
            let parsed: u64 = v.parse().map_err(|_| ConfigFileError::InvalidValue {
                section: "executor".to_string(),
                key: "chunk_size".to_string(),
                value: v.to_string(),
                reason: "must be a positive integer".to_string(),
            })?;
            if parsed == 0 {
                return Err(ConfigFileError::InvalidValue {
                    section: "executor".to_string(),
                    key: "chunk_size".to_string(),
                    value: v.to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
            config.executor.chunk_size = parsed;
        }
        if let Some(v) = section.get("checkpoint_interval") {
            config.executor.checkpoint_interval =
                v.parse().map_err(|_| ConfigFileError::InvalidValue {
                    section: "executor".to_string(),
                    key: "checkpoint_interval".to_string(),
                    value: v.to_string(),
                    reason: "must be a non-negative integer (0 disables checkpoints)".to_string(),
                })?;
        }
    }

    // [engine] section
    if let Some(section) = ini.section(Some("engine")) {
        if let Some(v) = section.get("default_platform") {
            let v = v.trim().to_lowercase();
            if !VALID_PLATFORMS.contains(&v.as_str()) {
                return Err(ConfigFileError::InvalidValue {
                    section: "engine".to_string(),
                    key: "default_platform".to_string(),
                    value: v,
                    reason: "must be one of: auto, cpu, cuda, opencl, reference".to_string(),
                });
            }
            config.engine.default_platform = v;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = v.to_string();
            }
        }
        if let Some(v) = section.get("level") {
            let v = v.trim().to_lowercase();
            if !VALID_LOG_LEVELS.contains(&v.as_str()) {
                return Err(ConfigFileError::InvalidValue {
                    section: "logging".to_string(),
                    key: "level".to_string(),
                    value: v,
                    reason: "must be one of: trace, debug, info, warn, error".to_string(),
                });
            }
            config.logging.level = v;
        }
    }

    Ok(config)
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::*;
    use tempfile::TempDir;

    #[test]
    fn test_expand_tilde() {
        let path = expand_tilde("~/test/path");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(path, home.join("test/path"));
        }

        let path = expand_tilde("/absolute/path");
        assert_eq!(path, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_partial_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        // Only specify some settings, rest should use defaults
        std::fs::write(
            &config_path,
            r#"
[executor]
max_concurrent_jobs = 4

[engine]
default_platform = cuda
"#,
        )
        .unwrap();

        let config = ConfigFile::load_from(&config_path).unwrap();

        // Specified values
        assert_eq!(config.executor.max_concurrent_jobs, 4);
        assert_eq!(config.engine.default_platform, "cuda");

        // Default values
        assert_eq!(config.executor.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(
            config.executor.checkpoint_interval,
            DEFAULT_CHECKPOINT_INTERVAL
        );
        assert_eq!(config.logging.level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_store_directory_expansion() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        std::fs::write(
            &config_path,
            r#"
[store]
directory = /data/simforge/jobs
"#,
        )
        .unwrap();

        let config = ConfigFile::load_from(&config_path).unwrap();
        assert_eq!(config.store.directory, PathBuf::from("/data/simforge/jobs"));
    }

    #[test]
    fn test_zero_max_concurrent_jobs_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        std::fs::write(
            &config_path,
            r#"
[executor]
max_concurrent_jobs = 0
"#,
        )
        .unwrap();

        let result = ConfigFile::load_from(&config_path);
        assert!(matches!(
            result,
            Err(ConfigFileError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        std::fs::write(
            &config_path,
            r#"
[executor]
chunk_size = 0
"#,
        )
        .unwrap();

        assert!(ConfigFile::load_from(&config_path).is_err());
    }

    #[test]
    fn test_zero_checkpoint_interval_allowed() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        std::fs::write(
            &config_path,
            r#"
[executor]
checkpoint_interval = 0
"#,
        )
        .unwrap();

        let config = ConfigFile::load_from(&config_path).unwrap();
        assert_eq!(config.executor.checkpoint_interval, 0);
    }

    #[test]
    fn test_invalid_platform_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        std::fs::write(
            &config_path,
            r#"
[engine]
default_platform = vulkan
"#,
        )
        .unwrap();

        assert!(ConfigFile::load_from(&config_path).is_err());
    }

    #[test]
    fn test_platform_is_lowercased() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        std::fs::write(
            &config_path,
            r#"
[engine]
default_platform = CUDA
"#,
        )
        .unwrap();

        let config = ConfigFile::load_from(&config_path).unwrap();
        assert_eq!(config.engine.default_platform, "cuda");
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        std::fs::write(
            &config_path,
            r#"
[logging]
level = verbose
"#,
        )
        .unwrap();

        assert!(ConfigFile::load_from(&config_path).is_err());
    }
}
