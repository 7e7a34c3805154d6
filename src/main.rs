use clap::Parser;
use small_press::config::toml_config::TomlConfig;
use small_press::core::{ConfigProvider, Storage};
use small_press::scope::BuildLock;
use small_press::utils::error::ErrorSeverity;
use small_press::utils::{logger, validation::Validate};
use small_press::{CliConfig, LocalStorage, PostPipeline, SiteEngine};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("🚀 Starting small-press");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Some(config_path) = config.config.clone() {
        tracing::info!("📁 Loading configuration from: {}", config_path);

        let toml_config = match TomlConfig::from_file(&config_path) {
            Ok(toml_config) => toml_config,
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", config_path, e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(1);
            }
        };

        run_with(toml_config, config.monitor, config.dry_run).await;
    } else {
        run_with(config.clone(), config.monitor, config.dry_run).await;
    }

    Ok(())
}

async fn run_with<C>(provider: C, monitor_enabled: bool, dry_run: bool)
where
    C: ConfigProvider + Validate,
{
    // 驗證配置
    if let Err(e) = provider.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    // 顯示配置摘要
    display_config_summary(&provider, dry_run);

    if dry_run {
        tracing::info!("🔍 DRY RUN MODE - No files will be written");
        if let Err(e) = perform_dry_run(&provider).await {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
        return;
    }

    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    match build_site(provider, monitor_enabled).await {
        Ok(output_path) => {
            tracing::info!("✅ Site build completed successfully!");
            tracing::info!("📁 Output saved to: {}", output_path);
            println!("✅ Site build completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Site build failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            // 輸出用戶友好的錯誤信息
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,      // 警告，但成功
                ErrorSeverity::Medium => 2,   // 重試錯誤
                ErrorSeverity::High => 1,     // 處理錯誤
                ErrorSeverity::Critical => 3, // 系統錯誤
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }
}

/// 建置鎖在這個函式結束時釋放,之後才輪到 process::exit
async fn build_site<C: ConfigProvider>(
    provider: C,
    monitor_enabled: bool,
) -> small_press::Result<String> {
    let _lock = BuildLock::acquire(Path::new(provider.output_dir()))?;

    let storage = LocalStorage::new(".".to_string());
    let pipeline = PostPipeline::new(storage, provider)?;
    let engine = SiteEngine::new_with_monitoring(pipeline, monitor_enabled);

    engine.run().await
}

fn display_config_summary<C: ConfigProvider>(config: &C, dry_run: bool) {
    println!("📋 Configuration Summary:");
    println!("  Site: {}", config.site_title());
    println!("  Content: {}", config.content_dir());
    println!("  Output: {}", config.output_dir());
    println!("  Default layout: {}", config.default_layout());
    println!("  Extensions: {}", config.content_extensions().join(", "));
    println!("  Code check: {}", config.code_check());
    println!("  Archive: {}", config.archive_enabled());

    if let Some(single) = config.single_file() {
        println!("  Single file: {}", single);
    }

    if config.include_drafts() {
        println!("  Drafts: included");
    }

    if dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run<C: ConfigProvider>(config: &C) -> small_press::Result<()> {
    println!("🔍 Dry Run Analysis:");
    println!();

    // 內容目錄分析
    println!("📥 Content Analysis:");
    let storage = LocalStorage::new(".".to_string());
    let files = storage.list_files(config.content_dir()).await?;

    let wanted: Vec<&String> = files
        .iter()
        .filter(|path| {
            Path::new(path.as_str())
                .extension()
                .and_then(|e| e.to_str())
                .map(|ext| config.content_extensions().iter().any(|a| a == ext))
                .unwrap_or(false)
        })
        .collect();

    println!("  Files found: {}", files.len());
    println!("  Will render: {}", wanted.len());
    for path in &wanted {
        println!("    {}", path);
    }

    println!();
    println!("💾 Output Configuration:");
    println!("  Path: {}", config.output_dir());
    println!(
        "  Files: one HTML per post, index.html, site.json{}",
        if config.archive_enabled() {
            ", site.zip"
        } else {
            ""
        }
    );

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");

    Ok(())
}
