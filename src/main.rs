use clap::error::ErrorKind;
use clap::Parser;
use mamscan::utils::error::{ErrorSeverity, ScanError};
use mamscan::utils::{logger, validation::Validate};
use mamscan::{CliConfig, EtlEngine, FsResultCache, LocalStorage, NcbiBlastClient, SurveyPipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = match CliConfig::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{}", e);
            return Ok(());
        }
        Err(e) => {
            // 參數錯誤：印出用法到 stdout，不產生任何輸出檔
            println!("{}", e.render());
            println!("{}", CliConfig::usage());
            std::process::exit(1);
        }
    };

    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting mamscan for project '{}'", cli.project);
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.load_scan_config() {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        exit_with(&e);
    }

    let project_dir = cli.project_dir();
    let storage = LocalStorage::new(project_dir.clone());
    let cache = FsResultCache::new(project_dir.join(&config.cache.dir));
    let client = NcbiBlastClient::new(config.search.clone())?;
    let pipeline = SurveyPipeline::new(storage, cache, client, config);

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - no searches will be submitted");
        let planned = match pipeline.plan().await {
            Ok(planned) => planned,
            Err(e) => exit_with(&e),
        };
        for search in &planned {
            let state = if search.cached { "cached " } else { "pending" };
            println!("  {}  {}", state, search.key.file_stem());
        }
        let pending = planned.iter().filter(|s| !s.cached).count();
        println!(
            "📋 {} searches planned, {} cached, {} pending",
            planned.len(),
            planned.len() - pending,
            pending
        );
        return Ok(());
    }

    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(output_path) => {
            let full_path = project_dir.join(&output_path);
            tracing::info!("✅ Survey completed successfully!");
            println!("✅ Survey completed successfully!");
            println!("📁 Output saved to: {}", full_path.display());
        }
        Err(e) => {
            tracing::error!(
                "❌ Survey failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            exit_with(&e);
        }
    }

    Ok(())
}

fn exit_with(e: &ScanError) -> ! {
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
