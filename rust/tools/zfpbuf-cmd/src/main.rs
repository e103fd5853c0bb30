use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;

mod commands;
mod utils;

#[derive(Parser)]
#[command(name = "zfpbuf-cmd")]
#[command(about = "Command-line utility for compressing numeric arrays with ZFP")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a raw array file into a ZFP stream
    Compress(commands::compress::CompressArgs),

    /// Decompress a ZFP stream into a raw array file
    Decompress {
        /// ZFP stream to decode
        #[arg(short, long)]
        input: String,

        /// Destination for the raw array bytes
        #[arg(short, long)]
        output: String,
    },

    /// Display the header of a ZFP stream as JSON
    Inspect {
        /// ZFP stream to inspect
        stream_path: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Compress(args) => commands::compress::run(args),
        Commands::Decompress { input, output } => commands::decompress::run(input, output),
        Commands::Inspect { stream_path } => commands::inspect::run(cli.verbose, stream_path),
    }
}

/// `RUST_LOG` takes precedence over the verbosity flag.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    builder.parse_default_env();
    builder.format(|buf, record| {
        use std::io::Write;
        writeln!(buf, "[{}] {}", record.level(), record.args())
    });
    let _ = builder.try_init();
}
