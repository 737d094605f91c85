//! # jd-cli — JETDECK from the terminal
//!
//! Bulk stream operations driven by a filter.
//!
//! - `jetdeck preview --name 'order-*' --messages '>100'` — list the streams a filter selects.
//! - `jetdeck delete ...` / `jetdeck purge ...` — run a confirmed bulk action.
//! - `jetdeck presets list|save|show` — manage saved filters.
//! - `jetdeck shell` — interactive query builder session.

mod clauses;
mod render;
mod shell;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};

use clauses::FilterArgs;
use jd_core::{BulkAction, SortColumn};
use jd_hub::config::Config;
use jd_hub::connectors::memory::MemoryCluster;
use jd_hub::connectors::{SnapshotProvider, StreamMutator};
use jd_hub::presets::{FilePresetStore, MemoryPresetStore, PresetStore};
use jd_hub::{ControllerOptions, QueryController};

/// JETDECK — find JetStream streams by name, age and size; delete or purge them in bulk.
#[derive(Parser, Debug)]
#[command(name = "jetdeck", version, about, long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/jetdeck/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// NATS server URL; overrides the configured context.
    #[arg(long, short = 's', global = true)]
    server: Option<String>,

    /// Refuse delete and purge.
    #[arg(long, short = 'r', global = true)]
    read_only: bool,

    /// Work on streams loaded from a JSON snapshot instead of a live server.
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Refuse to preview when a filter value is not a number.
    #[arg(long, global = true)]
    strict: bool,

    /// Log level for jetdeck's own output (RUST_LOG overrides).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the streams a filter selects.
    Preview {
        #[command(flatten)]
        filter: FilterArgs,

        /// Order the table by a column.
        #[arg(long, value_enum)]
        sort: Option<SortArg>,

        /// Descending order (with --sort).
        #[arg(long, requires = "sort")]
        desc: bool,

        /// Print the matched streams as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Delete every stream a filter selects.
    Delete {
        #[command(flatten)]
        filter: FilterArgs,

        /// Skip the confirmation prompt.
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Remove all messages from every stream a filter selects.
    Purge {
        #[command(flatten)]
        filter: FilterArgs,

        /// Skip the confirmation prompt.
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Manage saved filters.
    Presets {
        #[command(subcommand)]
        action: PresetCmd,
    },

    /// Interactive query builder session.
    Shell,

    /// Show where the configuration was loaded from.
    Config,
}

#[derive(Subcommand, Debug)]
enum PresetCmd {
    List,
    Save {
        #[arg(value_name = "NAME")]
        preset_name: String,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Preview a saved filter.
    Show {
        name: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SortArg {
    Name,
    Age,
    Msgs,
    Consumers,
}

impl From<SortArg> for SortColumn {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Name => SortColumn::Name,
            SortArg::Age => SortColumn::Age,
            SortArg::Msgs => SortColumn::Messages,
            SortArg::Consumers => SortColumn::Consumers,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    jd_hub::logging::init(&jd_hub::logging::directives_for(&cli.log_level));

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    rt.block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref(), cli.server.as_deref())?;
    if cli.read_only {
        config.read_only = true;
    }
    if cli.strict {
        config.strict_filter_values = true;
    }
    tracing::debug!("{}", config.describe_source());

    match cli.command {
        Commands::Config => {
            print_config(&config);
            Ok(())
        }
        command => {
            let mut controller = open_controller(cli.snapshot.as_deref(), &config).await?;
            execute(command, &mut controller).await
        }
    }
}

async fn open_controller(snapshot: Option<&Path>, config: &Config) -> anyhow::Result<QueryController> {
    let (provider, mutator) = connect(snapshot, config).await?;
    let presets: Arc<dyn PresetStore> = match config.presets_path() {
        Some(path) => Arc::new(FilePresetStore::new(path)),
        None => Arc::new(MemoryPresetStore::new()),
    };
    Ok(QueryController::new(
        provider,
        mutator,
        presets,
        ControllerOptions::from_config(config),
    ))
}

async fn execute(command: Commands, controller: &mut QueryController) -> anyhow::Result<()> {
    match command {
        Commands::Preview {
            filter,
            sort,
            desc,
            json,
        } => {
            filter.apply(controller).await?;
            controller.preview().await?;
            if let Some(column) = sort {
                controller.toggle_sort(column.into())?;
                if desc {
                    controller.toggle_sort(column.into())?;
                }
            }
            if json {
                println!("{}", serde_json::to_string_pretty(controller.matched())?);
            } else {
                println!(
                    "{}",
                    render::streams_table(controller.matched(), controller.sort_state(), Utc::now())
                );
            }
        }
        Commands::Delete { filter, yes } => {
            run_bulk(controller, &filter, BulkAction::Delete, yes).await?
        }
        Commands::Purge { filter, yes } => {
            run_bulk(controller, &filter, BulkAction::Purge, yes).await?
        }
        Commands::Presets { action } => match action {
            PresetCmd::List => {
                println!("{}", render::presets_table(&controller.list_presets().await?));
            }
            PresetCmd::Save {
                preset_name: name,
                filter,
            } => {
                if !filter.has_clauses() && filter.preset.is_none() {
                    bail!("refusing to save an empty filter; pass --name, --age, --consumers or --messages");
                }
                filter.apply(controller).await?;
                controller.save_preset(&name).await?;
                println!("Filter '{}' saved: {}", name.trim(), controller.predicate().describe());
            }
            PresetCmd::Show { name } => {
                controller.load_preset(&name).await?;
                println!("{}", controller.predicate().describe());
                println!(
                    "{}",
                    render::streams_table(controller.matched(), None, Utc::now())
                );
            }
        },
        Commands::Shell => shell::run(controller).await?,
        Commands::Config => {}
    }
    Ok(())
}

async fn connect(
    snapshot: Option<&Path>,
    config: &Config,
) -> anyhow::Result<(Arc<dyn SnapshotProvider>, Arc<dyn StreamMutator>)> {
    if let Some(path) = snapshot {
        let cluster = Arc::new(MemoryCluster::from_json_file(path).await?);
        let provider: Arc<dyn SnapshotProvider> = cluster.clone();
        let mutator: Arc<dyn StreamMutator> = cluster;
        return Ok((provider, mutator));
    }
    connect_live(config).await
}

#[cfg(feature = "nats")]
async fn connect_live(
    config: &Config,
) -> anyhow::Result<(Arc<dyn SnapshotProvider>, Arc<dyn StreamMutator>)> {
    use jd_hub::connectors::nats::NatsCluster;

    let context = config
        .current_context()
        .ok_or_else(|| anyhow!("no NATS context configured"))?;
    let cluster = Arc::new(
        NatsCluster::connect(context)
            .await
            .map_err(|e| anyhow!("failed to connect to {}: {}", context.server, e))?,
    );
    let provider: Arc<dyn SnapshotProvider> = cluster.clone();
    let mutator: Arc<dyn StreamMutator> = cluster;
    Ok((provider, mutator))
}

#[cfg(not(feature = "nats"))]
async fn connect_live(
    config: &Config,
) -> anyhow::Result<(Arc<dyn SnapshotProvider>, Arc<dyn StreamMutator>)> {
    let server = config
        .current_context()
        .map(|c| c.server.as_str())
        .ok_or_else(|| anyhow!("no NATS context configured"))?;
    bail!(
        "cannot reach {}: jetdeck was built without NATS support (rebuild with --features nats, or pass --snapshot <file>)",
        server
    )
}

async fn run_bulk(
    controller: &mut QueryController,
    filter: &FilterArgs,
    action: BulkAction,
    yes: bool,
) -> anyhow::Result<()> {
    filter.apply(controller).await?;
    controller.preview().await?;
    println!(
        "{}",
        render::streams_table(controller.matched(), None, Utc::now())
    );

    let prompt = controller.request(action)?;
    if !yes && !ask(&prompt.message())? {
        controller.cancel()?;
        eprintln!("Cancelled.");
        return Ok(());
    }

    controller.confirm()?;
    let report = controller.wait_bulk().await?;
    println!("{}", report.summary());
    if report.failed > 0 {
        for name in &report.failed_streams {
            eprintln!("  failed: {}", name);
        }
        bail!(
            "{} of {} streams could not be {}",
            report.failed,
            report.attempted,
            action.past_tense().to_lowercase()
        );
    }
    Ok(())
}

/// Blocking yes/no prompt on stderr/stdin. Anything but `y`/`yes` is a no.
fn ask(message: &str) -> anyhow::Result<bool> {
    use std::io::Write;

    eprint!("{}\n\nContinue? [y/N] ", message);
    std::io::stderr().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn print_config(config: &Config) {
    println!("{}", config.describe_source());
    if let Some(context) = config.current_context() {
        println!("context:   {} ({})", context.name, context.server);
    }
    println!("read-only: {}", config.read_only);
    println!("strict:    {}", config.strict_filter_values);
    println!("timeout:   {}ms", config.snapshot_timeout_ms);
    match config.presets_path() {
        Some(path) => println!("filters:   {}", path.display()),
        None => println!("filters:   (not persisted)"),
    }
}
