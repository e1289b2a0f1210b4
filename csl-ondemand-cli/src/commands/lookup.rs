//! Match command - find the best aircraft for a query.

use tokio_util::sync::CancellationToken;

use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

/// Arguments for the match command.
pub struct MatchArgs {
    pub icao: Option<String>,
    pub airline: Option<String>,
    pub livery: Option<String>,
}

/// Run the match command.
pub fn run(options: &GlobalOptions, args: MatchArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("match");

    let cancel = CancellationToken::new();
    let (service, _) = runner.start_service(&cancel)?;

    match service.find_match(
        args.icao.as_deref(),
        args.airline.as_deref(),
        args.livery.as_deref(),
    ) {
        Some(key) => {
            println!("{}", key);
            if let Some(aircraft) = service.snapshot().index().get(&key.root, &key.id) {
                for selector in &aircraft.selectors {
                    println!("  MATCHES {}", selector);
                }
            }
            Ok(())
        }
        None => {
            println!("No aircraft indexed.");
            Ok(())
        }
    }
}
