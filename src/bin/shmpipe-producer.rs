use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use shmpipe::{logging, ChannelKeys, Producer};

/// Copy stdin into a shared memory channel for `shmpipe-consumer`.
#[derive(Parser)]
#[command(name = "shmpipe-producer", version)]
struct Cli {
    /// Existing file to derive the channel keys from. Both peers must agree
    /// on it. Without it the fixed default keys are used.
    #[arg(long, value_name = "PATH")]
    key_path: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> shmpipe::Result<()> {
    let keys = match cli.key_path {
        Some(path) => ChannelKeys::from_path(path)?,
        None => ChannelKeys::default(),
    };
    let producer = Producer::create(keys)?;
    let summary = producer.run(io::stdin().lock())?;
    info!("sent {summary}");
    Ok(())
}
