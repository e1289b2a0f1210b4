//! CSL On-Demand CLI - index CSL packages and serve aircraft bundles.

mod commands;
mod error;
mod runner;
mod server;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use commands::bundle::BundleArgs;
use commands::lookup::MatchArgs;
use commands::serve::ServeArgs;
use runner::GlobalOptions;

#[derive(Debug, Parser)]
#[command(name = "csl-ondemand", version = csl_ondemand::VERSION)]
#[command(about = "On-demand CSL aircraft model bundles for multiplayer clients")]
struct Cli {
    /// Configuration file (default: ~/.csl-ondemand/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Resources root holding Doc8643.txt, related.txt and the CSL directory
    #[arg(long, global = true)]
    resources: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write a configuration file
    Init,

    /// Serve matches and bundles over HTTP
    Serve {
        /// Address to listen on
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// Route prefix (e.g. /csl)
        #[arg(long)]
        prefix: Option<String>,

        /// Reference textures below this URL instead of embedding them
        #[arg(long)]
        texture_base_url: Option<String>,
    },

    /// Build the index and print a summary
    Index {
        /// List every package and aircraft
        #[arg(long)]
        list: bool,
    },

    /// Find the best aircraft for an ICAO type, airline and livery
    Match {
        #[arg(long)]
        icao: Option<String>,

        #[arg(long)]
        airline: Option<String>,

        #[arg(long)]
        livery: Option<String>,
    },

    /// Assemble the bundle for one aircraft
    Bundle {
        /// Package root relative to the CSL directory
        root: String,

        /// Aircraft id
        id: String,

        /// Write the files below this directory
        #[arg(long)]
        out: Option<PathBuf>,

        /// Reference textures below this URL instead of embedding them
        #[arg(long)]
        texture_base_url: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    let options = GlobalOptions {
        config: cli.config,
        resources: cli.resources,
    };

    let result = match cli.command {
        Commands::Init => commands::init::run(&options),
        Commands::Serve {
            bind,
            prefix,
            texture_base_url,
        } => commands::serve::run(
            &options,
            ServeArgs {
                bind,
                prefix,
                texture_base_url,
            },
        ),
        Commands::Index { list } => commands::index::run(&options, list),
        Commands::Match {
            icao,
            airline,
            livery,
        } => commands::lookup::run(
            &options,
            MatchArgs {
                icao,
                airline,
                livery,
            },
        ),
        Commands::Bundle {
            root,
            id,
            out,
            texture_base_url,
        } => commands::bundle::run(
            &options,
            BundleArgs {
                root,
                id,
                out,
                texture_base_url,
            },
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}
