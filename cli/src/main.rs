use clap::Parser;

mod commands;

use commands::bnk::{BnkCommands, handle};

#[derive(Parser)]
#[command(name = "bnk-cli")]
#[command(about = "CLI for Wwise SoundBank (.bnk) files", long_about = None)]
struct Cli {
    /// Worker threads for decoding (0 = one per core)
    #[arg(long, global = true, default_value_t = 0)]
    workers: usize,
    /// Fail on banks without a media index instead of warning
    #[arg(long, global = true)]
    strict: bool,
    #[command(subcommand)]
    command: BnkCommands,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = bnk::DecodeOptions {
        workers: cli.workers,
        require_media_index: cli.strict,
        ..Default::default()
    };
    handle(cli.command, &options)
}
