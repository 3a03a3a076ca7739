use crate::config::toml_config::ScanConfig;
use crate::utils::error::{Result, ScanError};
use clap::Parser;
use std::path::PathBuf;

pub const CONFIG_FILENAME: &str = "mamscan.toml";
const MIN_PROJECT_NAME_LEN: usize = 3;

#[derive(Debug, Clone, Parser)]
#[command(name = "mamscan")]
#[command(about = "Classify organisms by magnetosome marker protein homology")]
pub struct CliConfig {
    /// Project selector in the form project=<name>
    #[arg(value_name = "project=<name>", value_parser = parse_project_arg)]
    pub project: String,

    /// TOML configuration file (defaults to <project>/mamscan.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory that contains the project directories
    #[arg(long, default_value = ".")]
    pub workdir: PathBuf,

    /// Show cached and pending searches without contacting the search service
    #[arg(long)]
    pub dry_run: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    pub fn usage() -> String {
        format!(
            "Usage: mamscan project=<name> [--config <FILE>] [--workdir <DIR>] [--dry-run] [--log-json] [--verbose]\n  \
             <name> must be at least {} characters; the project directory holds the \
             'organisms' list, the search cache and the result table.",
            MIN_PROJECT_NAME_LEN
        )
    }

    pub fn project_dir(&self) -> PathBuf {
        self.workdir.join(&self.project)
    }

    /// 明確指定的設定檔必須存在；否則沿用專案目錄下的 mamscan.toml 或預設值
    pub fn load_scan_config(&self) -> Result<ScanConfig> {
        if let Some(path) = &self.config {
            if !path.exists() {
                return Err(ScanError::MissingConfigError {
                    field: format!("config file {}", path.display()),
                });
            }
            return ScanConfig::from_file(path);
        }

        let default_path = self.project_dir().join(CONFIG_FILENAME);
        if default_path.exists() {
            tracing::info!("📁 Loading configuration from: {}", default_path.display());
            ScanConfig::from_file(default_path)
        } else {
            tracing::debug!("No {} in project, using defaults", CONFIG_FILENAME);
            Ok(ScanConfig::default())
        }
    }
}

/// Accepts `project=<name>` with a name of at least three characters.
pub fn parse_project_arg(value: &str) -> std::result::Result<String, String> {
    project_name(value).map_err(|e| e.to_string())
}

pub fn project_name(value: &str) -> Result<String> {
    let name = value
        .strip_prefix("project=")
        .ok_or_else(|| ScanError::UsageError {
            message: format!("expected project=<name>, got '{}'", value),
        })?;

    if name.chars().count() < MIN_PROJECT_NAME_LEN {
        return Err(ScanError::UsageError {
            message: format!(
                "project name '{}' must be at least {} characters",
                name, MIN_PROJECT_NAME_LEN
            ),
        });
    }

    Ok(name.to_string())
}
