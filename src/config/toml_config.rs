use crate::core::auth::DEFAULT_SECRET;
use crate::core::weight::{parse_date_key, DEFAULT_HEIGHT_CM};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, TrackerError};
use crate::utils::validation::{self, Validate};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CLASS_ID: &str = "main";
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_TARGET_DATE: &str = "2026-07-25";
pub const DEFAULT_SYNC_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub tracker: Option<TrackerSection>,
    pub weight: Option<WeightSection>,
    pub sync: Option<SyncSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerSection {
    pub class_id: Option<String>,
    pub class_name: Option<String>,
    pub data_dir: Option<String>,
    pub default_password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeightSection {
    pub height_cm: Option<f64>,
    pub target_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncSection {
    pub endpoint: Option<String>,
    pub enabled: Option<bool>,
    pub timeout_seconds: Option<u64>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(TrackerError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| TrackerError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SYNC_URL})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| TrackerError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

/// Command line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub class_id: Option<String>,
    pub data_dir: Option<String>,
    pub sync_endpoint: Option<String>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub class_id: String,
    pub class_name: Option<String>,
    pub data_dir: String,
    pub default_password: String,
    pub height_cm: f64,
    pub target_date: NaiveDate,
    pub sync_endpoint: Option<String>,
    pub sync_timeout: Duration,
}

impl Settings {
    pub fn resolve(file: TomlConfig, overrides: Overrides) -> Result<Self> {
        let tracker = file.tracker.unwrap_or_default();
        let weight = file.weight.unwrap_or_default();
        let sync = file.sync.unwrap_or_default();

        let target_raw = weight
            .target_date
            .unwrap_or_else(|| DEFAULT_TARGET_DATE.to_string());
        let target_date =
            parse_date_key(&target_raw).ok_or_else(|| TrackerError::InvalidConfigValueError {
                field: "weight.target_date".to_string(),
                value: target_raw.clone(),
                reason: "Expected YYYY-MM-DD".to_string(),
            })?;

        let sync_endpoint = overrides.sync_endpoint.or(if sync.enabled.unwrap_or(true) {
            sync.endpoint
        } else {
            None
        });

        Ok(Self {
            class_id: overrides
                .class_id
                .or(tracker.class_id)
                .unwrap_or_else(|| DEFAULT_CLASS_ID.to_string()),
            class_name: tracker.class_name,
            data_dir: overrides
                .data_dir
                .or(tracker.data_dir)
                .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
            default_password: tracker
                .default_password
                .unwrap_or_else(|| DEFAULT_SECRET.to_string()),
            height_cm: weight.height_cm.unwrap_or(DEFAULT_HEIGHT_CM),
            target_date,
            sync_endpoint: sync_endpoint.filter(|e| !e.trim().is_empty()),
            sync_timeout: Duration::from_secs(
                sync.timeout_seconds.unwrap_or(DEFAULT_SYNC_TIMEOUT_SECONDS),
            ),
        })
    }

    /// Reads `path` when it exists. A missing file is only fine when `required` is false.
    pub fn load(path: &str, required: bool, overrides: Overrides) -> Result<Self> {
        let file = if Path::new(path).exists() {
            tracing::debug!("Loading configuration from {}", path);
            TomlConfig::from_file(path)?
        } else if required {
            return Err(TrackerError::ConfigError {
                message: format!("configuration file '{}' not found", path),
            });
        } else {
            TomlConfig::default()
        };
        Self::resolve(file, overrides)
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validation::validate_slot_name("tracker.class_id", &self.class_id)?;
        validation::validate_path("tracker.data_dir", &self.data_dir)?;
        validation::validate_non_empty_string("tracker.default_password", &self.default_password)?;
        validation::validate_range("weight.height_cm", self.height_cm, 50.0, 280.0)?;
        if let Some(endpoint) = &self.sync_endpoint {
            validation::validate_url("sync.endpoint", endpoint)?;
        }
        validation::validate_range("sync.timeout_seconds", self.sync_timeout.as_secs(), 1, 300)?;
        Ok(())
    }
}

impl ConfigProvider for Settings {
    fn class_id(&self) -> &str {
        &self.class_id
    }

    fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    fn data_dir(&self) -> &str {
        &self.data_dir
    }

    fn default_password(&self) -> &str {
        &self.default_password
    }

    fn height_cm(&self) -> f64 {
        self.height_cm
    }

    fn target_date(&self) -> NaiveDate {
        self.target_date
    }

    fn sync_endpoint(&self) -> Option<&str> {
        self.sync_endpoint.as_deref()
    }

    fn sync_timeout(&self) -> Duration {
        self.sync_timeout
    }
}
