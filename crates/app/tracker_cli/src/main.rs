// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use clap::Parser;
use cli::{Cli, Commands};
use log::debug;
use tokio_util::sync::CancellationToken;
use tracker_core::{ClientConfig, SessionStore};

mod cli;
mod commands;
mod logging;
mod render;

/// Exit status after an interrupted command.
const EXIT_CANCELED: i32 = 130;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();
    let _logger = logging::init(args.verbose)?;

    if let Err(e) = run(args).await {
        if e.is_canceled() {
            std::process::exit(EXIT_CANCELED);
        }
        log::error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run(args: Cli) -> Result<()> {
    if let Commands::Version = args.command {
        println!(
            "{} {} (core {})",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            tracker_core::version()
        );
        return Ok(());
    }

    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &args.api_url {
        config = config.with_base_url(url)?;
    }
    if let Some(path) = args.token_file {
        config = config.with_token_path(path);
    }
    debug!(
        "API at {}, token file {}",
        config.base_url,
        config.token_path.display()
    );

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let ctx = commands::Context::new(SessionStore::with_reqwest(config), cancel);
    commands::dispatch(&ctx, args.command).await
}
