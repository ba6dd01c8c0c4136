//! svcspec CLI entrypoint.
//!
//! This is the main entrypoint for the svcspec command-line tool.

use std::io::Write;
use std::process::ExitCode;

use svcspec::cli::{Cli, Commands, CreateArgs, OutputFormatter};
use svcspec::error::Result;

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system. `RUST_LOG` overrides the verbosity flag.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Dispatches the parsed command.
fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);

    match cli.command {
        Commands::Create(args) => cmd_create(&args, &formatter),
    }
}

/// Compiles the service flags and prints the specification.
fn cmd_create(args: &CreateArgs, formatter: &OutputFormatter) -> Result<()> {
    let options = args.to_options()?;
    debug!(image = %options.image, mode = %options.mode, "Collected service options");

    if options.registry_auth {
        info!("Registry authentication details will be sent to swarm agents");
    }

    let spec = options.to_service()?;
    let output = formatter.format_service(&spec)?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{output}")?;
    Ok(())
}
