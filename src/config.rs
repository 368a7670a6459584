use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File as ConfigFile};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::usecase::ports::host::HostMode;
use crate::usecase::services::scan_service::ScanSettings;
use crate::usecase::services::split_service::SplitSettings;

const CONFIG_FILE_NAME: &str = "xlsplit.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub host: HostConfig,
    pub split: SplitConfig,
    pub scan: ScanConfig,
    pub analysis: AnalysisConfig,
    pub merge: MergeConfig,
    pub clean: CleanConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            host: HostConfig::default(),
            split: SplitConfig::default(),
            scan: ScanConfig::default(),
            analysis: AnalysisConfig::default(),
            merge: MergeConfig::default(),
            clean: CleanConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub mode: HostMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub delete_batch_size: usize,
    pub scratch_dir_name: String,
    pub output_dir_prefix: String,
    pub default_row_height: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        let settings = SplitSettings::default();
        Self {
            delete_batch_size: settings.delete_batch_size,
            scratch_dir_name: settings.scratch_dir_name,
            output_dir_prefix: "拆分结果".to_string(),
            default_row_height: settings.default_row_height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub row_ceiling: u32,
    pub summary_marker: String,
    pub lock_prefix: String,
    pub extensions: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        let settings = ScanSettings::default();
        Self {
            row_ceiling: settings.row_ceiling,
            summary_marker: settings.summary_marker,
            lock_prefix: settings.lock_prefix,
            extensions: settings.extensions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub row_ceiling: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { row_ceiling: 20_000 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub output_prefix: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            output_prefix: "合并汇总表".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanConfig {
    pub output_marker: String,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            output_marker: "清洗".to_string(),
        }
    }
}

impl AppConfig {
    pub fn split_settings(&self) -> SplitSettings {
        SplitSettings {
            delete_batch_size: self.split.delete_batch_size,
            scratch_dir_name: self.split.scratch_dir_name.clone(),
            default_row_height: self.split.default_row_height,
        }
    }

    pub fn scan_settings(&self) -> ScanSettings {
        ScanSettings {
            row_ceiling: self.scan.row_ceiling,
            summary_marker: self.scan.summary_marker.clone(),
            lock_prefix: self.scan.lock_prefix.clone(),
            extensions: self.scan.extensions.clone(),
        }
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.split.delete_batch_size == 0 {
            return Err(ConfigError::Message(
                "split.delete_batch_size must be at least 1".to_string(),
            ));
        }
        if self.scan.row_ceiling == 0 || self.analysis.row_ceiling == 0 {
            return Err(ConfigError::Message(
                "row ceilings must be at least 1".to_string(),
            ));
        }
        if self.split.scratch_dir_name.trim().is_empty() {
            return Err(ConfigError::Message(
                "split.scratch_dir_name must not be empty".to_string(),
            ));
        }
        Ok(self)
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "hellhbbd", "xlsplit")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Defaults, then the user config file, then `./xlsplit.toml`, then
/// `XLSPLIT__*` environment variables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let mut files: Vec<PathBuf> = user_config_path().into_iter().collect();
    files.push(PathBuf::from(CONFIG_FILE_NAME));
    load_from(&files, true)
}

fn load_from(files: &[PathBuf], with_env: bool) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();
    for file in files {
        builder = builder.add_source(ConfigFile::from(file.as_path()).required(false));
    }
    if with_env {
        builder = builder.add_source(
            Environment::with_prefix("XLSPLIT")
                .separator("__")
                .try_parsing(true),
        );
    }
    builder.build()?.try_deserialize::<AppConfig>()?.validate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after epoch")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("xlsplit-config-{nanos}"));
        std::fs::create_dir_all(&dir).expect("should create temp dir");
        let path = dir.join(name);
        std::fs::write(&path, contents).expect("should write config");
        path
    }

    #[test]
    fn missing_files_yield_defaults() {
        let config = load_from(&[PathBuf::from("/nonexistent/xlsplit.toml")], false)
            .expect("defaults should load");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.split.delete_batch_size, 50);
        assert_eq!(config.scan.row_ceiling, 30_000);
        assert_eq!(config.host.mode, HostMode::Auto);
    }

    #[test]
    fn file_overrides_only_named_keys() {
        let path = temp_file(
            "xlsplit.toml",
            "[split]\ndelete_batch_size = 10\n\n[host]\nmode = \"alternate\"\n",
        );
        let config = load_from(&[path.clone()], false).expect("file should load");
        assert_eq!(config.split.delete_batch_size, 10);
        assert_eq!(config.split.scratch_dir_name, "_temp_repair");
        assert_eq!(config.host.mode, HostMode::Alternate);
        assert_eq!(config.merge.output_prefix, "合并汇总表");
        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let path = temp_file("xlsplit.toml", "[split]\ndelete_batch_size = 0\n");
        assert!(load_from(&[path.clone()], false).is_err());
        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}
