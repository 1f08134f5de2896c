use ytmirror_core::logging;

mod cli;

use crate::cli::CliCommand;

fn main() {
    // Fall back to stderr logging when the state dir is unusable.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    if let Err(err) = CliCommand::run_from_args() {
        eprintln!("ytmirror error: {:#}", err);
        std::process::exit(1);
    }
}
