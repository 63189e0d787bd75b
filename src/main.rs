use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ocr_service::OcrService;
use ocr_service::config::Config;
use tracing_subscriber::EnvFilter;

/// Recognize text in one base64 image read as JSON from stdin.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Only check that the OCR engine initializes; stdin is not read
    #[arg(long)]
    test: bool,

    /// Directory holding the detection/recognition models [env: OCR_MODEL_DIR]
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Where to write the annotated image [env: OCR_VISUALIZATION_DIR]
    #[arg(long)]
    visualization_dir: Option<PathBuf>,

    /// Skip writing the annotated image
    #[arg(long)]
    no_visualization: bool,

    /// Inference threads [env: OCR_THREADS]
    #[arg(long)]
    threads: Option<i32>,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        if let Some(dir) = self.model_dir {
            config.model_dir = dir;
        }
        if let Some(dir) = self.visualization_dir {
            config.visualization_dir = Some(dir);
        }
        if self.no_visualization {
            config.visualize = false;
        }
        if let Some(threads) = self.threads.filter(|t| *t > 0) {
            config.threads = threads;
        }
    }
}

#[cfg(feature = "paddle")]
fn engine_builder(config: &Config) -> ocr_service::engine::paddle::PaddleBuilder {
    ocr_service::engine::paddle::PaddleBuilder::new(&config.model_dir, config.threads)
}

#[cfg(not(feature = "paddle"))]
fn engine_builder(_config: &Config) -> ocr_service::engine::Unavailable {
    ocr_service::engine::Unavailable
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let self_test = cli.test;
    let mut config = Config::from_env();
    cli.apply(&mut config);
    tracing::debug!(?config, "Configuration loaded");

    let service = OcrService::new(engine_builder(&config), config.visualization());
    let mut stdout = io::stdout().lock();

    let result = if self_test {
        tracing::info!("Test mode requested via --test flag");
        service.self_test(&mut stdout)
    } else {
        service.run(&mut io::stdin().lock(), &mut stdout)
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("Failed to write response: {e}");
            ExitCode::FAILURE
        }
    }
}
