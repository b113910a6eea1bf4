//! Main entry point for the `relay` binary.

use std::process::ExitCode;

use clap::Parser;
use relay_cli::{Cli, CliError, Exit};
use tracing::error;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = relay_common_log::init(cli.log_config()) {
        eprintln!("warning: {e}");
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: failed to start runtime: {e}");
            return Exit::GeneralError.into();
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => Exit::Success.into(),
        Err(e) => {
            error!(exit_code = e.exit_code() as u8, "command failed");
            eprintln!("error: {e}");
            e.exit_code().into()
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = cli.load_config()?;
    cli.execute(config).await
}
