use std::process::ExitCode;

use resample16::cli::{self, Command, USAGE, VersionInfo};
use resample16::common::errors::CliError;
use resample16::common::logger;
use resample16::configs::Config;

fn run() -> Result<(), CliError> {
    let args = match cli::parse(std::env::args().skip(1))? {
        Command::Version => {
            println!("{}", cli::version_text(&VersionInfo::default()));
            return Ok(());
        }
        Command::Convert(args) => args,
    };

    let config = Config::load().map_err(|e| CliError::Settings(e.to_string()))?;
    logger::init(config.logging.as_ref(), args.terse);

    cli::run(&args, &config)?;
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\n*** resample: {e}");
            if matches!(e, CliError::Usage(_)) {
                eprint!("{USAGE}");
            }
            ExitCode::FAILURE
        }
    }
}
