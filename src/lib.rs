pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::ncbi::NcbiBlastClient;
pub use adapters::storage::{FsResultCache, LocalStorage};
pub use config::toml_config::ScanConfig;
pub use core::{etl::EtlEngine, pipeline::SurveyPipeline};
pub use utils::error::{Result, ScanError};
