use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{error, info};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use lotvisor::transport::{self, Rooms, ServeError};
use lotvisor::{
    Config, ConfigError, Dispatch, LogWriter, LotService, Subscribe, wait_for_shutdown_signal,
};

#[derive(Parser, Debug)]
#[command(name = "lotvisord", about = "Parking lot occupancy daemon")]
struct Args {
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides `listen` from the configuration.
    #[arg(long)]
    listen: Option<String>,
}

#[derive(Error, Debug)]
enum DaemonError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Serve(#[from] ServeError),
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("[lotvisord] {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), DaemonError> {
    let mut cfg = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(listen) = args.listen {
        cfg.listen = listen;
    }

    let rooms = Arc::new(Rooms::new());
    let svc = LotService::builder(cfg.clone())
        .with_subscribers(vec![Arc::new(LogWriter) as Arc<dyn Subscribe>])
        .with_dispatcher(rooms.clone() as Arc<dyn Dispatch>)
        .build();

    let listener = transport::bind(&cfg.listen).await?;
    info!("[lotvisord] listening on {}", cfg.listen);

    let token = CancellationToken::new();
    let server = tokio::spawn(transport::serve(
        listener,
        Arc::clone(&svc),
        rooms,
        token.clone(),
    ));

    let signal = wait_for_shutdown_signal().await;
    svc.announce_shutdown();
    token.cancel();
    let _ = server.await;
    signal.map_err(ServeError::Signal)?;
    Ok(())
}
