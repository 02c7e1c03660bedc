//! enkaku binary
//!
//! Remote virtual filesystem tool: probe, read, and transfer resources
//! addressed by URI across HTTP(S), local-file, and in-memory backends.
//!
//! ```bash
//! enkaku probe https://example.com/data/report.pdf
//! enkaku cat https://example.com/notes.txt
//! enkaku copy https://example.com/big.bin file:///tmp/big.bin
//! enkaku move https://example.com/big.bin file:///tmp/big.bin   # refused: use copy
//! ```

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use enkaku_cli::Cli;

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let mut stdout = io::stdout().lock();
    match enkaku_cli::run(cli, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("enkaku: {e:#}");
            ExitCode::FAILURE
        }
    }
}
