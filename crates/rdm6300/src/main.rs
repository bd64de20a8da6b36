mod exit;
mod logging;
mod output;
mod run;

use std::path::PathBuf;

use clap::Parser;

use crate::logging::{init_logging, LogFormat, LogLevel};

#[derive(Parser, Debug)]
#[command(
    name = "rdm6300",
    version,
    about = "RFID reader interfacing with the RDM6300 module"
)]
struct Cli {
    /// Serial device (e.g., /dev/ttyUSB0).
    #[arg(long, value_name = "PATH")]
    device: PathBuf,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: LogLevel,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    match run::run(&cli.device) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
