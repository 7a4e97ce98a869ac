//! X-Fidelity CLI
//!
//! Archetype-driven repository static analysis.

mod cli;
mod discover;
mod output;

use std::process::ExitCode;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, PluginsCommands};
use xfidelity_config::{ConfigResolver, CoreOptions};
use xfidelity_engine::RuleEngine;
use xfidelity_orchestrator::{apply_exemptions, run_engine_on_files, ScanRequest};
use xfidelity_plugin::PluginRegistry;
use xfidelity_schema::FileData;
use xfidelity_telemetry::TracingSink;

/// Files above this size are skipped rather than loaded whole into
/// memory, matching the `maxFileSize` default (§6).
const MAX_FILE_SIZE_BYTES: u64 = 1024 * 1024;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("failed to start async runtime: {e}");
            return ExitCode::from(2);
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(true) => ExitCode::from(1),
        Ok(false) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:?}");
            ExitCode::from(2)
        }
    }
}

/// Returns `Ok(true)` when the scan produced reportable findings.
async fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Commands::Scan { path, archetype, config_server, local_config_path, extra_plugins, format } => {
            run_scan(path, archetype, config_server, local_config_path, extra_plugins, format).await
        }
        Commands::Plugins { command } => match command {
            PluginsCommands::List { archetype, local_config_path } => {
                let registry = PluginRegistry::new();
                let resolver = ConfigResolver::new(&registry);
                let options = CoreOptions { local_config_path, ..CoreOptions::default() };
                resolver.get_config(Some(&archetype), options).await.into_diagnostic()?;
                for name in registry.loaded_plugins() {
                    println!("{name}");
                }
                Ok(false)
            }
        },
    }
}

async fn run_scan(
    path: std::path::PathBuf,
    archetype: String,
    config_server: Option<String>,
    local_config_path: Option<String>,
    extra_plugins: Vec<String>,
    format: String,
) -> Result<bool> {
    let registry = PluginRegistry::new();
    let resolver = ConfigResolver::new(&registry);
    let options = CoreOptions {
        config_server,
        local_config_path,
        extra_plugins,
        repo_path: Some(path.to_string_lossy().into_owned()),
    };

    let config = resolver
        .get_config(Some(&archetype), options)
        .await
        .into_diagnostic()?;

    let engine = RuleEngine::new(config.rules.clone(), registry.all_operators(), registry.all_facts());

    let discovered = discover::discover_files(&path);
    let mut file_data: Vec<FileData> = Vec::with_capacity(discovered.len() + 1);
    for file_path in discovered {
        match std::fs::metadata(&file_path) {
            Ok(meta) if meta.len() > MAX_FILE_SIZE_BYTES => {
                warn!(file = %file_path.display(), size = meta.len(), "skipping oversized file");
                continue;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(file = %file_path.display(), error = %e, "skipping unreadable file");
                continue;
            }
        }
        match std::fs::read_to_string(&file_path) {
            Ok(content) => file_data.push(FileData::new(file_path, content)),
            Err(e) => warn!(file = %file_path.display(), error = %e, "skipping non-utf8 file"),
        }
    }
    file_data.push(FileData::new(
        xfidelity_schema::REPO_GLOBAL_CHECK,
        String::new(),
    ));

    let request = ScanRequest {
        file_data,
        archetype: config.archetype.clone(),
        installed_dependency_versions: serde_json::json!({}),
        minimum_dependency_versions: serde_json::to_value(&config.archetype.config.minimum_dependency_versions)
            .unwrap_or(serde_json::Value::Null),
        standard_structure: config.archetype.config.standard_structure.clone(),
        repo_path: Some(path.clone()),
    };

    let mut results = run_engine_on_files(&engine, request).await;

    let telemetry = xfidelity_telemetry::collect_telemetry_data(&path, None).await;
    if !telemetry.repo_url.is_empty() {
        apply_exemptions(&mut results, &config.exemptions, &telemetry.repo_url, &TracingSink);
    }

    info!(files = results.len(), "scan complete");
    print!("{}", output::render(&results, &format));

    Ok(output::has_reportable_findings(&results))
}
