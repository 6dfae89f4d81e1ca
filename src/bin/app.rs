use std::process::ExitCode;

use log::{error, info};

use myrtio_matrix_light::cli::{self, Command};
use myrtio_matrix_light::shutdown::ShutdownSignal;
use myrtio_matrix_light::{BUILD_VERSION, app, drivers};

const PROGRAM: &str = "myrtio-matrix-light";

#[allow(clippy::print_stderr, clippy::print_stdout)]
fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let program = std::env::args().next().unwrap_or_else(|| PROGRAM.to_owned());
    let options = match cli::parse_args(std::env::args().skip(1)) {
        Ok(Command::Run(options)) => options,
        Ok(Command::Version) => {
            println!("{program} version {BUILD_VERSION}");
            return ExitCode::SUCCESS;
        }
        Ok(Command::Help) => {
            eprint!("{}", cli::usage(&program));
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("{e}");
            eprint!("{}", cli::usage(&program));
            return ExitCode::FAILURE;
        }
    };

    let shutdown = ShutdownSignal::new();
    if let Err(e) = shutdown.install() {
        error!("failed to install signal handlers: {e}");
        return ExitCode::FAILURE;
    }

    info!("{PROGRAM} {BUILD_VERSION}");
    match app::run(drivers::default_driver(), &options, &shutdown) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
