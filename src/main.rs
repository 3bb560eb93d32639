use clap::Parser;
use tradesim::cli::{run, Cli};
use tradesim::logging::{init_logging, LogConfig};

fn main() -> std::process::ExitCode {
    if let Err(e) = init_logging(&LogConfig::from_env()) {
        eprintln!("warning: logging disabled: {e}");
    }
    run(Cli::parse())
}
