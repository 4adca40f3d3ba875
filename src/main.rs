//! reptyr
//!
//! Attach a running process to the current terminal.

use std::io;
use std::process::ExitCode;

use reptyr::app::{init_logging, SessionConfig};
use reptyr::attach::{Completion, Orchestrator, SystemBackend};
use reptyr::cli::Cli;
use reptyr::Error;

fn main() -> ExitCode {
    let cli = match Cli::parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // Help and version go to stdout and are not failures
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        },
    };

    let config = SessionConfig::stdio(cli.verbose);
    init_logging(&config);

    let mode = match cli.into_mode() {
        Ok(mode) => mode,
        Err(e) => {
            tracing::error!("{}", e);
            if matches!(e, Error::Usage(_)) {
                eprintln!("{}", Cli::usage());
            }
            return ExitCode::from(e.exit_code());
        },
    };

    let orchestrator = Orchestrator::new(SystemBackend, config);
    match orchestrator.execute(mode, &mut io::stdout()) {
        Ok(Completion::Relayed(ended)) => {
            tracing::debug!("Session over: {:?}", ended);
            ExitCode::SUCCESS
        },
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            orchestrator.report_failure(&e);
            ExitCode::from(e.exit_code())
        },
    }
}
