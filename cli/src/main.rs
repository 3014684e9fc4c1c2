use std::time::Instant;

use clap::Parser;
use dirwatch_cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let started = Instant::now();
    dirwatch_cli::run_main(Cli::parse(), started).await
}
