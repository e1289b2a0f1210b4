//! Index command - build the cache and print what was loaded.

use tokio_util::sync::CancellationToken;

use crate::error::CliError;
use crate::runner::{cancel_on_ctrlc, CliRunner, GlobalOptions};

/// Run the index command.
pub fn run(options: &GlobalOptions, list: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("index");

    let cancel = CancellationToken::new();
    cancel_on_ctrlc(&cancel)?;
    let (service, summary) = runner.start_service(&cancel)?;
    let snapshot = service.snapshot();

    if list {
        for package in snapshot.index().packages() {
            let exports: Vec<&str> = package.export_names.iter().map(String::as_str).collect();
            println!("{} [{}]", package.root, exports.join(", "));
            for aircraft in package.aircraft() {
                println!("  {} ({} selectors)", aircraft.id, aircraft.selectors.len());
            }
        }
        println!();
    }

    println!("{}", summary);
    Ok(())
}
