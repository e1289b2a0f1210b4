//! Bundle command - assemble the files for one aircraft.

use std::fs;
use std::path::{Path, PathBuf};

use csl_ondemand::bundle::{Bundle, PartBody};
use tokio_util::sync::CancellationToken;

use crate::error::CliError;
use crate::runner::{cancel_on_ctrlc, CliRunner, GlobalOptions};

/// Arguments for the bundle command.
pub struct BundleArgs {
    pub root: String,
    pub id: String,
    /// Write parts below this directory instead of listing them.
    pub out: Option<PathBuf>,
    pub texture_base_url: Option<String>,
}

/// Run the bundle command.
pub fn run(options: &GlobalOptions, args: BundleArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("bundle");

    let cancel = CancellationToken::new();
    cancel_on_ctrlc(&cancel)?;
    let (service, _) = runner.start_service(&cancel)?;

    let texture_base_url = args
        .texture_base_url
        .as_deref()
        .or(runner.config().server.texture_base_url.as_deref());
    let bundle = runner.runtime().block_on(service.assemble_bundle(
        &args.root,
        &args.id,
        texture_base_url,
        &cancel,
    ))?;

    match &args.out {
        Some(out) => write_bundle(&bundle, out),
        None => {
            list_bundle(&bundle);
            Ok(())
        }
    }
}

fn list_bundle(bundle: &Bundle) {
    println!("Bundle {}", bundle.key());
    for part in bundle.parts() {
        let location = match &part.body {
            PartBody::Inline(_) => String::new(),
            PartBody::External { url, .. } => format!("  -> {}", url),
        };
        println!(
            "  {:<48} {:>10}  {}{}",
            part.filename,
            part.len(),
            part.content_type,
            location
        );
    }
    println!("{} parts, {} bytes", bundle.parts().len(), bundle.total_len());
}

/// Write embedded parts below `out`, reproducing the package layout.
fn write_bundle(bundle: &Bundle, out: &Path) -> Result<(), CliError> {
    let mut written = 0;
    for part in bundle.parts() {
        let Some(bytes) = part.bytes() else {
            println!("  skipped {} (served by reference)", part.filename);
            continue;
        };
        let path = part
            .filename
            .split('/')
            .fold(out.to_path_buf(), |path, segment| path.join(segment));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| CliError::Output {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, bytes).map_err(|source| CliError::Output {
            path: path.clone(),
            source,
        })?;
        written += 1;
    }
    println!("Wrote {} files to {}", written, out.display());
    Ok(())
}
