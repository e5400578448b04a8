//! bigip-ctlr - render AS3 declarations from resource snapshots

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use kube::CustomResourceExt;

use bigip_ctlr::common::crd::TLSProfile;
use bigip_ctlr::common::telemetry::{init_logging, LoggingConfig};
use bigip_ctlr::{ControllerMode, ResourceSnapshot, SynthesisConfig};

/// bigip-ctlr - AS3 declaration synthesis for Kubernetes and OpenShift
#[derive(Parser, Debug)]
#[command(name = "bigip-ctlr", version, about, long_about = None)]
struct Cli {
    /// Generate CRD manifests and exit
    #[arg(long)]
    crd: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "BIGIP_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render the AS3 declaration for a resource snapshot
    ///
    /// Prints the request body as pretty JSON on stdout. Diagnostics raised
    /// during synthesis are logged to stderr.
    Render(RenderArgs),
}

/// Render mode arguments
#[derive(Parser, Debug)]
struct RenderArgs {
    /// Path to the resource snapshot (YAML or JSON)
    #[arg(short = 's', long)]
    snapshot: PathBuf,

    /// Path to the synthesis configuration file
    #[arg(short = 'c', long = "config", env = "BIGIP_CONFIG")]
    config_file: Option<PathBuf>,

    /// Path to a ConfigMap manifest holding an override declaration
    #[arg(long = "override")]
    override_file: Option<PathBuf>,

    /// Target partition (overrides the config file)
    #[arg(long, env = "BIGIP_PARTITION")]
    partition: Option<String>,

    /// Client tag for the controls object (overrides the config file)
    #[arg(long, env = "BIGIP_USER_AGENT")]
    user_agent: Option<String>,

    /// Controller mode: kubernetes, openshift or customresource
    #[arg(long, env = "BIGIP_MODE")]
    mode: Option<ControllerMode>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.crd {
        let crd = serde_yaml::to_string(&TLSProfile::crd())
            .map_err(|e| anyhow::anyhow!("Failed to serialize CRD: {}", e))?;
        println!("{crd}");
        return Ok(());
    }

    init_logging(LoggingConfig {
        json: cli.log_json,
        ..LoggingConfig::default()
    })?;

    match cli.command {
        Some(Commands::Render(args)) => run_render(args),
        None => anyhow::bail!("no command given; run with --help for usage"),
    }
}

/// Load inputs, run a synthesis pass and print the declaration
fn run_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut config = match &args.config_file {
        Some(path) => SynthesisConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SynthesisConfig::default(),
    };
    if let Some(partition) = args.partition {
        config.partition = partition;
    }
    if let Some(user_agent) = args.user_agent {
        config.user_agent = user_agent;
    }
    if let Some(mode) = args.mode {
        config.mode = mode;
    }

    let snapshot = ResourceSnapshot::load(&args.snapshot)
        .with_context(|| format!("Failed to load snapshot {}", args.snapshot.display()))?;

    let override_cm = args
        .override_file
        .as_deref()
        .map(bigip_ctlr::read_override_configmap)
        .transpose()
        .context("Failed to load override ConfigMap")?;

    let assembled = bigip_ctlr::render_snapshot(&config, &snapshot, override_cm.as_ref())?;
    if !assembled.diagnostics.is_empty() {
        tracing::warn!(
            count = assembled.diagnostics.len(),
            "some resources were skipped during synthesis"
        );
    }

    let rendered = assembled
        .render()
        .map_err(bigip_ctlr::Error::from)
        .context("Failed to render declaration")?;
    println!("{rendered}");
    Ok(())
}
