// churn_dash - main.rs
// Loads configuration, feature spec and model once, then dispatches the CLI command.

use clap::Parser;
use std::process::exit;

use churn_dash::cli::{dispatch, Cli};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = dispatch(cli) {
        eprintln!("❌ {e:#}");
        exit(1);
    }
}
