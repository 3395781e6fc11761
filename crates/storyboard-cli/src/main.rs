//! Storyboard CLI - split scripts into shots and describe them with an LLM.

use clap::Parser;
use std::sync::Arc;
use storyboard_cli::commands;
use storyboard_cli::repl;
use storyboard_cli::{Cli, Command, Config, Formatter};
use storyboard_llm::OpenAiCompatibleProvider;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr; `RUST_LOG` wins over `-v`
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> storyboard_cli::Result<()> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::path()?,
    };

    // Load or create config
    let mut config = if config_path.exists() {
        Config::load_from(&config_path)?
    } else {
        let cfg = Config::default();
        cfg.save_to(&config_path).ok();
        cfg
    };

    // Override profile if specified
    if let Some(profile_name) = cli.profile {
        config.switch_profile(profile_name)?;
    }

    // Determine output format
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    let formatter = Formatter::new(format, color_enabled);
    let api_key = cli.api_key.as_deref();
    let pipeline = config.settings.pipeline.clone();
    let style = config.settings.style_suffix.clone();

    match cli.command {
        None | Some(Command::Repl) => {
            repl::run_repl(&mut config, &config_path, api_key, &formatter).await?;
        }
        Some(Command::Providers) => {
            commands::execute_providers(&formatter)?;
        }
        Some(Command::Profile(args)) => {
            commands::execute_profile(args, &mut config, &config_path, &formatter)?;
        }
        Some(cmd) => {
            // Commands that call the model
            let provider = Arc::new(OpenAiCompatibleProvider::new(
                config.provider_config(api_key)?,
            )?);

            match cmd {
                Command::Split(args) => {
                    commands::execute_split(args, provider, &pipeline, &formatter).await?;
                }
                Command::Describe(args) => {
                    commands::execute_describe(args, provider, &pipeline, &style, &formatter).await?;
                }
                Command::Run(args) => {
                    commands::execute_run(args, provider, &pipeline, &style, &formatter).await?;
                }
                _ => unreachable!(),
            }
        }
    }

    Ok(())
}
