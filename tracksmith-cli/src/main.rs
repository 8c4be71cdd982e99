//! Tracksmith - declare catalog events and keep their pinned versions in sync
//!
//! Thin command layer over tracksmith-core: argument parsing, logging setup,
//! and user-facing messages. All reconciliation logic lives in the core.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use tracksmith_core::catalog::{CategoryFilter, HttpCatalog};
use tracksmith_core::plugin::{PluginOptions, Source, TargetPlugin};
use tracksmith_core::reconcile::Reconciler;
use tracksmith_core::workspace::{ConfigRegistry, CONFIG_FILE};

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Generation targets accepted on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceArg {
    Ios,
    Android,
    Web,
}

impl From<SourceArg> for Source {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Ios => Source::Ios,
            SourceArg::Android => Source::Android,
            SourceArg::Web => Source::Web,
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "tracksmith",
    about = "Declare analytics events from a central catalog and keep their versions in sync",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Path to the workspace configuration file
    #[clap(long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Base URL of the remote event catalog
    #[clap(
        long,
        global = true,
        env = "TRACKSMITH_API_URL",
        default_value = "https://catalog.tracksmith.dev/api/v1"
    )]
    api_url: String,

    /// API token for the remote catalog
    #[clap(long, global = true, env = "TRACKSMITH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Log level
    #[clap(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a workspace configuration in the current directory
    Init {
        /// Generation target
        #[clap(long, value_enum)]
        source: SourceArg,

        /// Output path for generated code, relative to the current directory
        #[clap(long)]
        output: Option<String>,

        /// Name of the generated top-level type
        #[clap(long)]
        type_name: Option<String>,

        /// Package name (android target)
        #[clap(long)]
        package: Option<String>,

        /// Namespace (web target)
        #[clap(long)]
        namespace: Option<String>,

        /// Skip doc comments on generated declarations
        #[clap(long)]
        no_docs: bool,

        /// Wrap generated declarations in a wrapper type
        #[clap(long)]
        wrapper: bool,
    },

    /// Add one event from the catalog
    Add {
        /// Catalog event id
        event_id: String,

        /// Pin a specific version instead of the latest
        #[clap(long)]
        version: Option<i64>,
    },

    /// Add every event in a category, or the whole catalog
    AddAll {
        /// Restrict to a category by id
        #[clap(long, conflicts_with = "category")]
        category_id: Option<String>,

        /// Restrict to a category by name
        #[clap(long)]
        category: Option<String>,
    },

    /// Re-pin events at their latest catalog versions
    Update {
        /// Event ids to update; all declared events when omitted
        ids: Vec<String>,
    },

    /// List declared events whose pinned version differs from the catalog
    Outdated,

    /// Remove a declared event
    Remove {
        /// Catalog event id
        event_id: String,
    },

    /// List the declared events
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.to_filter_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Init {
            source,
            output,
            type_name,
            package,
            namespace,
            no_docs,
            wrapper,
        } => {
            let source = Source::from(source);
            let working_dir = std::env::current_dir()
                .context("Failed to determine the current directory")?;
            let options = PluginOptions {
                output,
                type_name,
                package_name: package,
                namespace,
                include_documentation: !no_docs,
                emit_wrapper: wrapper,
            };
            let plugin = TargetPlugin::new(source, options, &working_dir)?;
            let registry = ConfigRegistry::create_default(&cli.config, source, plugin)?;
            println!("Created {}", registry.path().display());
            println!(
                "Generated code will be written to {}",
                registry.plugin().await.output_file_path().display()
            );
        }

        Command::Add { ref event_id, version } => {
            let reconciler = reconciler(&cli)?;
            let event = reconciler.add(event_id, version).await?;
            println!(
                "Added '{}' at version {}",
                event.id,
                event.effective_version()
            );
        }

        Command::AddAll {
            ref category_id,
            ref category,
        } => {
            let filter = match (category_id, category) {
                (Some(id), _) => CategoryFilter::Id(id.clone()),
                (None, Some(name)) => CategoryFilter::Name(name.clone()),
                (None, None) => CategoryFilter::All,
            };
            let reconciler = reconciler(&cli)?;
            let report = reconciler.add_by_category(&filter).await?;
            println!(
                "Added {} events ({} already present)",
                report.added, report.already_present
            );
        }

        Command::Update { ref ids } => {
            let reconciler = reconciler(&cli)?;
            let report = reconciler.update(ids).await?;
            if report.updated.is_empty() {
                println!("All events are up to date");
            } else {
                for updated in &report.updated {
                    println!("Updated '{}': {} -> {}", updated.id, updated.from, updated.to);
                }
                println!(
                    "Updated {} events, {} already up to date",
                    report.updated.len(),
                    report.up_to_date
                );
            }
        }

        Command::Outdated => {
            let reconciler = reconciler(&cli)?;
            let stale = reconciler.outdated().await?;
            if stale.is_empty() {
                println!("All events are up to date");
            } else {
                for event in &stale {
                    println!("'{}': local {} -> latest {}", event.id, event.local, event.remote);
                }
            }
        }

        Command::Remove { ref event_id } => {
            let reconciler = reconciler(&cli)?;
            reconciler.remove(event_id).await?;
            println!("Removed '{event_id}'");
            println!("Regenerate your tracking code to drop it from the output");
        }

        Command::List => {
            let registry = ConfigRegistry::open(&cli.config)?;
            let events = registry.events().await;
            if events.is_empty() {
                println!("No events declared");
            } else {
                for event in &events {
                    println!("{} (version {})", event.id, event.effective_version());
                }
            }
        }
    }

    Ok(())
}

/// Wire up the engine: open the local registry and the catalog client.
fn reconciler(cli: &Cli) -> Result<Reconciler> {
    debug!("Using catalog at {}", cli.api_url);
    let registry = ConfigRegistry::open(&cli.config)?;
    let token = cli
        .token
        .clone()
        .context("No API token; pass --token or set TRACKSMITH_TOKEN")?;
    let catalog = HttpCatalog::new(&cli.api_url, token)?;
    Ok(Reconciler::new(Arc::new(registry), Arc::new(catalog)))
}
