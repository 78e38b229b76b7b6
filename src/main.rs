use std::process::ExitCode;

use clap::Parser;

use volserve::config::{Config, Overrides};
use volserve::error::ServerError;
use volserve::logger;
use volserve::server::{self, FileServer};

/// Serve a removable volume, directory or single file over HTTP
#[derive(Debug, Parser)]
#[command(name = "volserve", version, about)]
struct Cli {
    /// Configuration file, extension optional
    #[arg(short, long, default_value = "config", env = "VOLSERVE_CONFIG")]
    config: String,

    /// Directory or file to serve
    #[arg(short, long)]
    root: Option<String>,

    /// Address to bind (all interfaces when omitted)
    #[arg(long)]
    host: Option<String>,

    #[arg(short, long)]
    port: Option<u16>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let overrides = Overrides {
        root: cli.root,
        host: cli.host,
        port: cli.port,
    };

    let cfg = match Config::load_from(&cli.config, &overrides) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("[CONFIG] {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logger::init(&cfg.logging) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    match run(cfg) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger::log_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn run(cfg: Config) -> Result<(), ServerError> {
    // Size the runtime from the workers setting
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
        tracing::info!("[CONFIG] Using {workers} worker threads");
    } else {
        tracing::info!("[CONFIG] Using default worker threads (CPU cores)");
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), ServerError> {
    let root = cfg.storage.root.clone();
    let mut file_server = FileServer::from_config(cfg)?;

    let addr = file_server.start().await?;
    logger::log_server_start(
        &addr,
        &file_server.base_url(),
        &root,
        file_server.resolver().root().is_directory(),
    );

    let waited = server::wait_for_shutdown().await;
    file_server.stop().await;
    waited?;
    Ok(())
}
