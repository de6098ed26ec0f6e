//! Command-line interface for topsub
//!
//! This module provides argument parsing and the top-level `run()` that
//! wires configuration assembly, plugin resolution, and the submission
//! orchestrator together.

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;
use std::path::PathBuf;

use tracing::{debug, error};

use crate::{
    ExitCode, PluginRegistry, SubmissionArgs, Submitter, TopologyDescriptor, assemble, logging,
    parse_override,
};

/// topsub - submit a stream-processing topology to a cluster
#[derive(Debug, Parser)]
#[command(name = "topsub")]
#[command(about = "Submit a stream-processing topology to a cluster scheduling framework")]
#[command(long_about = r#"
topsub uploads a topology's deployable package into shared storage and
registers its launch with the cluster scheduler, as a single all-or-nothing
attempt: if any step fails, partial effects are rolled back.

EXAMPLES:
  # Submit a topology to the devel cluster
  topsub --cluster devel --role ads --environment staging \
         --home /opt/topsub --config-path /opt/topsub/conf \
         --topology-package ./word-count.tar.gz \
         --topology-defn ./word-count.json \
         --topology-artifact ./word-count.jar

  # Override individual configuration keys
  topsub ... -o topsub.packing.containers=8 -o topsub.class.uploader=localfs

CONFIGURATION:
  Settings merge with precedence: defaults < <config-path>/<cluster>.toml
  < command line < topology-derived values, then ${key} placeholders are
  expanded against the merged map.

EXIT CODES:
  0  topology submitted and committed
  1  any failure (arguments, validation, upload, launch)
"#)]
#[command(version)]
pub struct Cli {
    /// Cluster the topology should run on
    #[arg(short, long)]
    pub cluster: String,

    /// Role the topology runs under
    #[arg(short, long)]
    pub role: String,

    /// Environment tag the topology runs in (e.g. devel, staging, prod)
    #[arg(short, long)]
    pub environment: String,

    /// Directory where topsub is installed
    #[arg(short = 'd', long)]
    pub home: PathBuf,

    /// Directory containing cluster configuration files
    #[arg(short = 'p', long)]
    pub config_path: PathBuf,

    /// Package containing the user artifact, definition and config
    #[arg(short = 'y', long)]
    pub topology_package: PathBuf,

    /// Serialized topology definition file
    #[arg(short = 'f', long)]
    pub topology_defn: PathBuf,

    /// User-submitted topology artifact (jar or tarball)
    #[arg(short = 'j', long)]
    pub topology_artifact: PathBuf,

    /// Configuration overrides applied after the cluster file
    #[arg(short = 'o', long = "config-override", value_name = "KEY=VALUE")]
    pub config_overrides: Vec<String>,

    /// Enable debug logs
    #[arg(short, long)]
    pub verbose: bool,
}

/// Build the CLI command structure without parsing arguments.
/// Used for introspection in tests.
#[must_use]
pub fn build_cli() -> clap::Command {
    <Cli as clap::CommandFactory>::command()
}

/// Main CLI execution function.
///
/// This function handles ALL output including errors. It returns
/// `Result<(), ExitCode>`: `Ok(())` after a committed submission (or a help
/// invocation), `Err(ExitCode)` otherwise. main.rs only calls
/// `std::process::exit(code.as_i32())` on error - it does NOT print.
pub fn run() -> Result<(), ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version print usage and succeed without attempting
            // submission; any other parse error is a failed attempt.
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => Ok(()),
                _ => Err(ExitCode::FAILURE),
            };
        }
    };

    // Logging is installed exactly once per process lifecycle, here.
    if let Err(e) = logging::init_tracing(cli.verbose) {
        eprintln!("failed to initialize logging: {e}");
        return Err(ExitCode::FAILURE);
    }

    let submitter = match prepare(&cli) {
        Ok(submitter) => submitter,
        Err(e) => {
            error!(error = %format!("{e:#}"), "submission aborted");
            return Err(ExitCode::FAILURE);
        }
    };

    // Create tokio runtime for the async portions of the attempt
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to create async runtime");
            return Err(ExitCode::FAILURE);
        }
    };

    let outcome = rt.block_on(submitter.submit());
    if outcome.success {
        Ok(())
    } else {
        Err(outcome.exit_code())
    }
}

/// Load the topology definition, assemble the configuration, and resolve
/// the configured collaborators. Everything here is fatal: it runs before
/// any external side effect exists, so there is nothing to roll back.
fn prepare(cli: &Cli) -> Result<Submitter> {
    let topology = TopologyDescriptor::load(&cli.topology_defn)
        .context("failed to load topology definition")?;

    let mut overrides = Vec::with_capacity(cli.config_overrides.len());
    for raw in &cli.config_overrides {
        overrides.push(parse_override(raw).context("invalid --config-override")?);
    }

    let args = SubmissionArgs {
        cluster: cli.cluster.clone(),
        role: cli.role.clone(),
        environ: cli.environment.clone(),
        home: cli.home.clone(),
        config_path: cli.config_path.clone(),
        topology_package: cli.topology_package.clone(),
        topology_defn: cli.topology_defn.clone(),
        topology_artifact: cli.topology_artifact.clone(),
        config_overrides: overrides,
    };
    let config = assemble(&args, &topology).context("failed to assemble configuration")?;
    debug!(keys = config.len(), topology = %topology.name, "configuration assembled");

    let registry = PluginRegistry::with_builtins();
    let statemgr = registry
        .resolve_state_manager(&config)
        .context("failed to resolve state manager")?;
    let uploader = registry
        .resolve_uploader(&config)
        .context("failed to resolve uploader")?;
    let launcher = registry
        .resolve_launcher(&config)
        .context("failed to resolve launcher")?;
    let packing = registry
        .resolve_packing(&config)
        .context("failed to resolve packing strategy")?;

    Ok(Submitter::new(
        config, topology, statemgr, uploader, launcher, packing,
    ))
}
