use std::env;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::resolve::{resolve_config, ResolvedConfig};
use crate::config::ConfigError;
use crate::error::{LineageError, Result};
use crate::graph::ancestry::{build_ancestry_graph, AncestryGraph, AncestryOptions};
use crate::graph::dependency::{build_dependency_graph, parse_edge_direction, DependencyOptions};
use crate::graph::paths::{describe_path, leaf_to_root_paths};
use crate::graph::viz::{render_as, DotProducer, JsonProducer, Producer, RenderOptions, TreeProducer};
use crate::registry::SnapshotRegistry;
use crate::util::output;

#[derive(Parser, Debug)]
#[command(name = "lineage")]
#[command(about = "Package version ancestry and dependency graphs", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(short, long, global = true)]
    pub snapshot: Option<PathBuf>,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    #[arg(short, long, global = true)]
    pub quiet: bool,
    #[arg(long, global = true)]
    pub no_color: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the ancestry tree of a package or version.
    Ancestry(AncestryArgs),
    /// List leaf-to-root ancestry paths.
    Paths(PathsArgs),
    /// Show the dependency graph of a version build as DOT.
    Deps(DepsArgs),
}

#[derive(Args, Debug)]
pub struct AncestryArgs {
    pub anchor: String,
    #[arg(short = 'f', long, default_value = "tree")]
    pub format: String,
    /// Render only the subtree under this version id.
    #[arg(long)]
    pub root: Option<String>,
    #[arg(long)]
    pub verbose_labels: bool,
}

#[derive(Args, Debug)]
pub struct PathsArgs {
    pub anchor: String,
    #[arg(short = 't', long)]
    pub target: Option<String>,
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct DepsArgs {
    pub anchor: String,
    #[arg(long)]
    pub edge_direction: Option<String>,
    /// Use direct dependencies when the transitive graph is not ready.
    #[arg(long)]
    pub flat: bool,
    #[arg(long)]
    pub verbose_labels: bool,
}

pub fn run() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);
    output::configure_colors(!cli.no_color);
    if let Err(err) = dispatch(cli) {
        output::error(&err.to_string());
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match verbose {
        0 if quiet => "error",
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn dispatch(cli: Cli) -> Result<()> {
    let cwd = env::current_dir()?;
    let resolved = resolve_config(&cwd, cli.config)?;
    let snapshot = resolved.snapshot_path(cli.snapshot)?;
    let registry = SnapshotRegistry::load(&snapshot)?;

    match cli.command {
        Commands::Ancestry(args) => handle_ancestry(args, &registry, &resolved),
        Commands::Paths(args) => handle_paths(args, &registry, &resolved),
        Commands::Deps(args) => handle_deps(args, &registry, &resolved),
    }
}

fn load_ancestry(
    anchor: &str,
    registry: &SnapshotRegistry,
    resolved: &ResolvedConfig,
) -> Result<AncestryGraph> {
    let options = AncestryOptions {
        jobs: resolved.config.build.jobs,
    };
    build_ancestry_graph(registry, anchor, &options)
}

fn handle_ancestry(
    args: AncestryArgs,
    registry: &SnapshotRegistry,
    resolved: &ResolvedConfig,
) -> Result<()> {
    let graph = load_ancestry(&args.anchor, registry, resolved)?;
    let options = RenderOptions {
        verbose: args.verbose_labels || resolved.config.render.verbose,
    };
    let root = args.root.as_deref();

    match args.format.to_ascii_lowercase().as_str() {
        "tree" => {
            let producer = render_as::<TreeProducer>(&graph, root, &options)?;
            output::emit(&producer.produce());
            Ok(())
        }
        "json" => {
            let producer = render_as::<JsonProducer>(&graph, root, &options)?;
            let json = serde_json::to_string_pretty(&producer.produce())
                .map_err(|err| LineageError::Other(anyhow::Error::new(err)))?;
            output::emit(&json);
            Ok(())
        }
        "dot" => {
            let producer = render_as::<DotProducer>(&graph, root, &options)?;
            output::emit(&producer.produce());
            Ok(())
        }
        other => Err(LineageError::Other(anyhow::anyhow!(
            "unknown ancestry format '{}'",
            other
        ))),
    }
}

fn handle_paths(args: PathsArgs, registry: &SnapshotRegistry, resolved: &ResolvedConfig) -> Result<()> {
    let graph = load_ancestry(&args.anchor, registry, resolved)?;
    let paths = leaf_to_root_paths(&graph, args.target.as_deref());

    if args.json {
        let json = serde_json::to_string_pretty(&paths)
            .map_err(|err| LineageError::Other(anyhow::Error::new(err)))?;
        output::emit(&json);
        return Ok(());
    }

    if paths.is_empty() {
        output::warn("no matching ancestry paths");
        return Ok(());
    }
    let lines: Vec<String> = paths
        .iter()
        .map(|path| describe_path(&graph, path))
        .collect();
    output::emit(&lines.join("\n"));
    Ok(())
}

fn handle_deps(args: DepsArgs, registry: &SnapshotRegistry, resolved: &ResolvedConfig) -> Result<()> {
    let edge_direction = match args.edge_direction.as_deref() {
        Some(raw) => parse_edge_direction(raw).ok_or_else(|| {
            LineageError::Config(ConfigError::InvalidValue {
                key: "--edge-direction".to_string(),
                value: raw.to_string(),
            })
        })?,
        None => resolved.config.render.edge_direction,
    };
    let options = DependencyOptions {
        verbose: args.verbose_labels || resolved.config.render.verbose,
        edge_direction,
        allow_flat: args.flat,
    };

    let graph = build_dependency_graph(registry, &args.anchor, options)?;
    output::emit(&graph.to_dot());
    Ok(())
}
