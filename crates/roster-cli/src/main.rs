use clap::Parser;

mod cli;
pub mod exit_codes;
mod logging;

use cli::args::Cli;
use cli::commands::dispatch;
use roster_core::RosterError;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.log_format, cli.verbose) {
        eprintln!("fatal: failed to initialize logging: {e}");
        std::process::exit(exit_codes::CONFIG_ERROR);
    }

    let code = match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => match e.downcast_ref::<RosterError>() {
            Some(roster) => {
                eprintln!("error: {roster}");
                roster.exit_code()
            }
            None => {
                eprintln!("fatal: {e:?}");
                exit_codes::CONFIG_ERROR
            }
        },
    };
    std::process::exit(code);
}
