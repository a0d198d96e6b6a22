use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use shmpipe::{logging, ChannelKeys, Consumer};

/// Copy a shared memory channel filled by `shmpipe-producer` to stdout.
#[derive(Parser)]
#[command(name = "shmpipe-consumer", version)]
struct Cli {
    /// Existing file to derive the channel keys from. Must match the
    /// producer's.
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
    let consumer = Consumer::open(keys)?;
    let summary = consumer.run(BufWriter::new(io::stdout().lock()))?;
    info!("received {summary}");
    Ok(())
}
