use anyhow::Context;
use clap::Parser;
use pawtrack_cli::cli::{Cli, Commands, RunArgs};
use pawtrack_cli::report::{render_breeds, render_detection};
use pawtrack_detect::{load_config, DetectorConfig, LoaderState, ModelLoader, PetDetector};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let opts = cli.command.opts().clone();

    init_logging(opts.verbose);

    let loader = build_loader(&opts)?;
    loader.spawn();

    info!("Loading pet detection model...");
    if let LoaderState::Failed { message } = loader.wait_settled().await {
        eprintln!("{}", message);
        return Ok(ExitCode::FAILURE);
    }

    let detector = PetDetector::new(loader);

    match cli.command {
        Commands::Detect { image, .. } => {
            let bytes = tokio::fs::read(&image)
                .await
                .with_context(|| format!("Failed to read {}", image.display()))?;

            let result = detector.detect_and_classify(&bytes).await;
            if opts.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", render_detection(&result));
            }
        }

        Commands::Breeds { image, .. } => {
            let bytes = tokio::fs::read(&image)
                .await
                .with_context(|| format!("Failed to read {}", image.display()))?;

            let breeds = detector.classify_breed(&bytes).await;
            if opts.json {
                println!("{}", serde_json::to_string_pretty(&breeds)?);
            } else {
                match breeds {
                    Some(breeds) => print!("{}", render_breeds(&breeds)),
                    None => println!("No pet breeds recognised"),
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn build_loader(opts: &RunArgs) -> anyhow::Result<Arc<ModelLoader>> {
    let mut config = match &opts.config {
        Some(path) => load_config(path)?,
        None => DetectorConfig::default(),
    };

    if let Some(relay) = &opts.relay {
        config = config.with_relay_base(relay)?;
    }

    if let Some(relay) = &config.relay {
        info!(endpoint = %relay.endpoint, "Routing model downloads through relay");
    }

    Ok(config.build_loader()?)
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "pawtrack=debug"
    } else {
        "pawtrack=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
