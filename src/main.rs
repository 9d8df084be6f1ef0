//! FiveWhy CLI entry point

use clap::Parser;
use fivewhy::cli::{run_cli, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let code = run_cli(cli).await;
    std::process::exit(code);
}
