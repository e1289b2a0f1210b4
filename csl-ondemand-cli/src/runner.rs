//! Shared setup for commands that need the service.

use std::path::PathBuf;
use std::sync::Arc;

use csl_ondemand::config::{config_file_path, ConfigFile, CslConfig};
use csl_ondemand::logging::init_logging;
use csl_ondemand::service::{CslService, RebuildSummary};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use crate::error::CliError;

/// Options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Configuration file; defaults to `~/.csl-ondemand/config.ini`.
    pub config: Option<PathBuf>,
    /// Resources root; overrides the configuration file.
    pub resources: Option<PathBuf>,
}

impl GlobalOptions {
    /// Load the configuration file, applying CLI overrides.
    pub fn load_config(&self) -> Result<ConfigFile, CliError> {
        let path = self.config.clone().unwrap_or_else(config_file_path);
        let mut config = ConfigFile::load_from(&path)?;
        if let Some(resources) = &self.resources {
            config.resources.root = Some(resources.clone());
        }
        Ok(config)
    }
}

/// Configuration, logging and runtime for one CLI invocation.
pub struct CliRunner {
    config: ConfigFile,
    csl: CslConfig,
    runtime: Runtime,
    _log_guard: Option<WorkerGuard>,
}

impl CliRunner {
    /// Load configuration, install logging and create the runtime.
    pub fn new(options: &GlobalOptions) -> Result<Self, CliError> {
        let config = options.load_config()?;
        let csl = CslConfig::from_config_file(&config).ok_or_else(|| {
            CliError::Config(
                "resources root is not set. \
                 Set root in the [resources] section of config.ini, CSL_RESOURCES, or use --resources"
                    .to_string(),
            )
        })?;
        let log_guard = init_logging(&config.logging)?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| CliError::RuntimeCreation(e.to_string()))?;

        Ok(Self {
            config,
            csl,
            runtime,
            _log_guard: log_guard,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn csl_config(&self) -> &CslConfig {
        &self.csl
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Log the command and effective resources root.
    pub fn log_startup(&self, command: &str) {
        info!(
            version = csl_ondemand::VERSION,
            command,
            resources = %self.csl.resources().display(),
            "csl-ondemand starting"
        );
    }

    /// Create the service and load the cache.
    pub fn start_service(
        &self,
        cancel: &CancellationToken,
    ) -> Result<(Arc<CslService>, RebuildSummary), CliError> {
        let service = Arc::new(CslService::new(self.csl.clone()));
        let summary = self.runtime.block_on(service.rebuild_cache(cancel))?;
        Ok((service, summary))
    }
}

/// Cancel `token` when Ctrl-C is pressed.
pub fn cancel_on_ctrlc(token: &CancellationToken) -> Result<(), CliError> {
    let token = token.clone();
    ctrlc::set_handler(move || {
        info!("Interrupt received, shutting down");
        token.cancel();
    })
    .map_err(|e| CliError::Signal(e.to_string()))
}
