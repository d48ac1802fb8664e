//! check_wildfly - Nagios probe for the WildFly management API
//!
//! Prints one status line on stdout and exits with the plugin status code.

use clap::error::ErrorKind;
use clap::Parser;
use tracing::debug;

use check_wildfly::check::{CheckEngine, CheckOutcome, Status, StatusFormatter};
use check_wildfly::cli::Cli;
use check_wildfly::error::CheckError;
use check_wildfly::state::FileStateStore;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                // help and version are not failures
                let _ = err.print();
                std::process::exit(0);
            }
            _ => {
                let rendered = err.to_string();
                let reason = rendered.lines().next().unwrap_or_default();
                println!(
                    "{} - {}",
                    Status::Unknown,
                    reason.trim_start_matches("error: ")
                );
                std::process::exit(Status::Unknown.exit_code());
            }
        },
    };

    if let Err(e) = check_wildfly::init_logging(&cli.log_level.to_string()) {
        eprintln!("{}", e);
    }

    debug!(
        version = env!("CARGO_PKG_VERSION"),
        action = %cli.action,
        "Starting check"
    );

    let formatter = StatusFormatter::new().with_perf_data(cli.perf_data);
    let outcome = run(&cli).await;

    println!("{}", formatter.format(&outcome));
    std::process::exit(outcome.exit_code());
}

async fn run(cli: &Cli) -> CheckOutcome {
    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => return CheckOutcome::from_error(&CheckError::from(e)),
    };

    let mut engine = match CheckEngine::new(&config) {
        Ok(engine) => engine,
        Err(e) => return CheckOutcome::from_error(&e),
    };
    if let Some(dir) = &config.state_dir {
        engine = engine.with_state_store(Box::new(FileStateStore::new(dir)));
    }

    engine.run(&cli.to_request()).await
}
