//! Binary entry point for interview-coach.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use clap::Parser;
use interview_coach::cli::output::{OutputFormat, format_error};
use interview_coach::cli::{Cli, execute};
use interview_coach::{config, logging};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::debug;

fn main() -> ExitCode {
    // `.env` must be applied before clap reads `env = ...` defaults.
    let dotenv = config::load_dotenv();
    let cli = Cli::parse();
    let format = OutputFormat::parse(&cli.format);
    logging::init(cli.verbose);

    match &dotenv {
        Ok(Some(path)) => debug!(path = %path.display(), "loaded .env"),
        Ok(None) => {}
        Err(e) => {
            report(e, format);
            return ExitCode::FAILURE;
        }
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: cannot start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(execute(&cli)) {
        Ok(output) => {
            if !output.is_empty() {
                // Handle broken pipe gracefully (e.g., when piped to `head` or `jq`)
                if let Err(e) = write!(io::stdout(), "{output}")
                    && e.kind() != io::ErrorKind::BrokenPipe
                {
                    eprintln!("Error writing to stdout: {e}");
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            report(&e, format);
            ExitCode::FAILURE
        }
    }
}

fn report(error: &interview_coach::Error, format: OutputFormat) {
    let error_output = format_error(error, format);
    match format {
        // JSON errors go to stdout for programmatic parsing
        OutputFormat::Json => println!("{error_output}"),
        OutputFormat::Text => eprintln!("Error: {error_output}"),
    }
}
