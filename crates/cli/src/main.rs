use std::process::ExitCode;

use clap::Parser;

use cargobay_cli::{Cli, execute};
use cargobay_infra::Config;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.verbose {
        0 => cargobay_observability::init(),
        1 => cargobay_observability::init_with_default("debug"),
        _ => cargobay_observability::init_with_default("trace"),
    }

    let result = Config::from_env()
        .map_err(anyhow::Error::from)
        .and_then(|config| execute(cli, config));

    match result {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
