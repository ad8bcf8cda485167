//! Redub - automated video dubbing
//!
//! Entry point for the web form and the command line. A video is transcribed,
//! translated, voiced with edge-tts and muxed back, optionally lip-synced
//! with Wav2Lip.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use redub::cli::{Args, Commands};
use redub::config::Config;
use redub::setup::SetupManager;
use redub::workflow::{DubRequest, Workflow};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    if let Commands::InitConfig { output, force } = &args.command {
        if output.exists() && !force {
            anyhow::bail!("{} already exists; pass --force to overwrite", output.display());
        }
        Config::default().save_to_file(output)?;
        info!("Wrote default configuration to {}", output.display());
        return Ok(());
    }

    let mut config = Config::load(args.config.as_deref())?;
    if let Commands::Serve { addr, port } = &args.command {
        if let Some(addr) = addr {
            config.server.addr = addr.clone();
        }
        if let Some(port) = port {
            config.server.port = *port;
        }
    }

    let setup_manager = SetupManager;
    setup_manager.initialize(&config).await?;

    let config = Arc::new(config);
    let workflow = Workflow::from_config(config.clone())?;

    match args.command {
        Commands::Serve { .. } => {
            let statuses = setup_manager.check_tools(&config).await;
            let missing = statuses.iter().filter(|status| !status.available).count();
            if missing > 0 {
                warn!("{} external tool(s) missing; run `redub check` for details", missing);
            }
            if config.hf_token.is_none() {
                warn!("HF_TOKEN is not set; transcription may fail for gated models");
            }

            redub::server::serve(Arc::new(workflow)).await?;
        }

        Commands::Dub { input, language, lip_sync, output_dir } => {
            workflow.check_dependencies().await?;

            let request = DubRequest {
                video: input,
                target_language: Some(language),
                lip_sync,
            };

            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
            );
            spinner.enable_steady_tick(Duration::from_millis(120));
            spinner.set_message(format!("Dubbing {}", request.video.display()));

            let result = workflow.process(&request).await;
            spinner.finish_and_clear();
            let outcome = result?;

            for warning in &outcome.warnings {
                warn!("{}", warning);
            }

            let final_path = match output_dir {
                Some(dir) => copy_into(&outcome.output_video, &dir).await?,
                None => outcome.output_video,
            };
            println!("{}", final_path.display());
        }

        Commands::Batch { input_dir, language, lip_sync } => {
            workflow.check_dependencies().await?;

            let outcomes = workflow.process_directory(&input_dir, &language, lip_sync).await?;
            info!("Batch finished: {} video(s) dubbed", outcomes.len());
            for outcome in &outcomes {
                println!("{}", outcome.output_video.display());
            }
        }

        Commands::Languages => {
            println!("\nSupported Languages:");
            println!("{:<22} {:<8} {:<24}", "Name", "Code", "Voice");
            println!("{}", "-".repeat(56));
            for entry in config.languages.entries() {
                println!("{:<22} {:<8} {:<24}", entry.name, entry.code, entry.voice);
            }
        }

        Commands::Check => {
            let statuses = setup_manager.check_tools(&config).await;

            println!("\nExternal Tools:");
            println!("{:<40} {:<28} {:<10} {}", "Tool", "Used for", "Status", "Detail");
            println!("{}", "-".repeat(100));
            for status in &statuses {
                let state = if status.available { "OK" } else { "Missing" };
                println!("{:<40} {:<28} {:<10} {}", status.name, status.stage, state, status.detail);
            }
        }

        // Written before any configuration is loaded
        Commands::InitConfig { .. } => {}
    }

    Ok(())
}

/// Copy the dubbed video into the requested directory, keeping its name
async fn copy_into(video: &Path, dir: &Path) -> Result<std::path::PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let file_name = video
        .file_name()
        .context("dubbed video path has no file name")?;
    let target = dir.join(file_name);

    tokio::fs::copy(video, &target)
        .await
        .with_context(|| format!("Failed to copy output to {}", target.display()))?;
    Ok(target)
}

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = std::env::current_dir()?.join(".redub").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "redub.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("redub.log").display());

    Ok(())
}
