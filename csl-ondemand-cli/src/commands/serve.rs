//! Serve command - host the service over HTTP.

use std::net::SocketAddr;

use tokio_util::sync::CancellationToken;

use crate::error::CliError;
use crate::runner::{cancel_on_ctrlc, CliRunner, GlobalOptions};
use crate::server::{self, AppState};

/// Arguments for the serve command.
pub struct ServeArgs {
    pub bind: Option<SocketAddr>,
    pub prefix: Option<String>,
    pub texture_base_url: Option<String>,
}

/// Run the serve command.
pub fn run(options: &GlobalOptions, args: ServeArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("serve");
    let settings = &runner.config().server;

    let shutdown = CancellationToken::new();
    cancel_on_ctrlc(&shutdown)?;
    let (service, summary) = runner.start_service(&shutdown)?;

    let prefix = args
        .prefix
        .map(|p| {
            let trimmed = p.trim_matches('/').to_string();
            if trimmed.is_empty() {
                trimmed
            } else {
                format!("/{}", trimmed)
            }
        })
        .unwrap_or_else(|| settings.path_prefix.clone());
    let bind = args.bind.unwrap_or(settings.bind);

    let state = AppState {
        service,
        prefix,
        texture_base_url: args
            .texture_base_url
            .or_else(|| settings.texture_base_url.clone())
            .map(|url| url.trim_end_matches('/').to_string()),
        shutdown,
    };

    println!("{}", summary);
    println!();
    println!("Serving CSL bundles on http://{}{}", bind, state.prefix);
    println!("Press Ctrl+C to stop");
    runner.runtime().block_on(server::serve(state, bind))
}
