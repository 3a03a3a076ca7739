use crate::core::classifier::ClassifierSettings;
use crate::utils::error::{Result, ScanError};
use crate::utils::retry::RetryPolicy;
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// 整體設定，所有區段皆可省略並採用預設值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub classifier: ClassifierSettings,
    pub search: SearchSettings,
    pub input: InputSettings,
    pub cache: CacheSettings,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub endpoint: String,
    pub program: String,
    pub database: String,
    pub hitlist_size: usize,
    pub expect: f64,
    /// 每次送出新查詢前的等待，遵守 NCBI 的頻率限制
    pub request_delay_seconds: u64,
    pub retry_delay_seconds: u64,
    /// 未設定代表無限重試
    pub max_attempts: Option<u32>,
    pub poll_interval_seconds: u64,
    pub max_polls: Option<u32>,
    pub timeout_seconds: Option<u64>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://blast.ncbi.nlm.nih.gov/Blast.cgi".to_string(),
            program: "blastp".to_string(),
            database: "nr".to_string(),
            hitlist_size: 50,
            expect: 10.0,
            request_delay_seconds: 5,
            retry_delay_seconds: 10,
            max_attempts: None,
            poll_interval_seconds: 20,
            max_polls: None,
            timeout_seconds: None,
        }
    }
}

impl SearchSettings {
    pub fn request_delay(&self) -> Duration {
        Duration::from_secs(self.request_delay_seconds)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(Duration::from_secs(self.retry_delay_seconds), self.max_attempts)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    pub organisms_file: String,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            organisms_file: "organisms".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub dir: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            dir: "saved_data".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub filename: String,
    /// 若設定，另外輸出所有物種（含被排除者）的證據 JSON
    pub evidence_report: Option<String>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            filename: "result.tsv".to_string(),
            evidence_report: None,
        }
    }
}

impl ScanConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ScanError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${BLAST_ENDPOINT})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ScanError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("search.endpoint", &self.search.endpoint)?;
        validation::validate_non_empty_string("search.program", &self.search.program)?;
        validation::validate_non_empty_string("search.database", &self.search.database)?;
        validation::validate_positive_number("search.hitlist_size", self.search.hitlist_size, 1)?;
        if let Some(max_attempts) = self.search.max_attempts {
            validation::validate_positive_number("search.max_attempts", max_attempts as usize, 1)?;
        }

        validation::validate_non_empty_string("classifier.block_word", &self.classifier.block_word)?;
        validation::validate_range(
            "classifier.weak.max_evalue",
            self.classifier.weak.max_evalue,
            0.0,
            f64::MAX,
        )?;
        validation::validate_range(
            "classifier.strong.max_evalue",
            self.classifier.strong.max_evalue,
            0.0,
            self.classifier.weak.max_evalue,
        )?;
        validation::validate_range(
            "classifier.strong.min_identities",
            self.classifier.strong.min_identities,
            self.classifier.weak.min_identities,
            u32::MAX,
        )?;

        validation::validate_path("input.organisms_file", &self.input.organisms_file)?;
        validation::validate_path("cache.dir", &self.cache.dir)?;
        validation::validate_path("output.filename", &self.output.filename)?;
        if let Some(report) = &self.output.evidence_report {
            validation::validate_path("output.evidence_report", report)?;
        }

        Ok(())
    }
}

impl Validate for ScanConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
