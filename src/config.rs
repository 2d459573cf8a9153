use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::model::JobKind;

const APP_DIR_NAME: &str = "creator-administrator";

/// Settings shared by both trackers. Loaded once at startup and passed down
/// by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_days_to_keep_jobs")]
    pub days_to_keep_jobs: i64,

    #[serde(default = "default_accepted_extensions")]
    pub accepted_extensions: Vec<String>,

    #[serde(default = "default_accepted_materials")]
    pub accepted_materials: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print_tracker_file: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print_jobs_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub laser_tracker_file: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub laser_jobs_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Config rooted at `data_dir` with every other value at its default.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            days_to_keep_jobs: default_days_to_keep_jobs(),
            accepted_extensions: default_accepted_extensions(),
            accepted_materials: default_accepted_materials(),
            print_tracker_file: None,
            print_jobs_dir: None,
            laser_tracker_file: None,
            laser_jobs_dir: None,
        }
    }

    pub fn tracker_file(&self, kind: JobKind) -> PathBuf {
        let configured = match kind {
            JobKind::Print => &self.print_tracker_file,
            JobKind::Laser => &self.laser_tracker_file,
        };
        configured
            .clone()
            .unwrap_or_else(|| self.data_dir.join(format!("{}_job_log.json", kind.as_str())))
    }

    pub fn jobs_dir(&self, kind: JobKind) -> PathBuf {
        let configured = match kind {
            JobKind::Print => &self.print_jobs_dir,
            JobKind::Laser => &self.laser_jobs_dir,
        };
        configured
            .clone()
            .unwrap_or_else(|| self.data_dir.join(format!("{}_jobs", kind.as_str())))
    }

    pub fn is_accepted_extension(&self, file_name: &str) -> bool {
        let lower = file_name.to_ascii_lowercase();
        self.accepted_extensions
            .iter()
            .any(|ext| lower.ends_with(&ext.to_ascii_lowercase()))
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Load `Config.toml` from the working directory (if present), overlaid with
/// `JOB_LEDGER_*` environment variables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    build_configuration(ConfigFile::with_name("Config").required(false))
}

pub fn load_configuration_from(path: &Path) -> Result<AppConfig, ConfigError> {
    build_configuration(ConfigFile::from(path).required(true))
}

fn build_configuration<S>(file: S) -> Result<AppConfig, ConfigError>
where
    S: config::Source + Send + Sync + 'static,
{
    let builder = Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix("JOB_LEDGER")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("accepted_extensions")
                .with_list_parse_key("accepted_materials"),
        )
        .build()?;
    let config = builder.try_deserialize::<AppConfig>()?;

    if config.days_to_keep_jobs < 0 {
        return Err(ConfigError::Message(format!(
            "days_to_keep_jobs must not be negative, got {}",
            config.days_to_keep_jobs
        )));
    }
    Ok(config)
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(format!(".{}", APP_DIR_NAME)))
}

fn default_days_to_keep_jobs() -> i64 {
    14
}

fn default_accepted_extensions() -> Vec<String> {
    [".stl", ".3mf", ".obj", ".dxf", ".svg", ".pdf"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_accepted_materials() -> Vec<String> {
    ["mdf", "triplex", "karton", "acrylaat"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
