#![forbid(unsafe_code)]

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{Level as TraceLevel, info, warn};
use tracing_subscriber::FmtSubscriber;

use map_label_layout::font::build_measurer;
use map_label_layout::persistence::{FileStore, PersistenceStore};
use map_label_layout::{EngineConfig, LabelEngine, LabelId, LabelRequest, MemorySurface, Scope};

#[derive(Parser, Debug)]
#[command(name = "map-label-layout", version, about = "Collision-avoiding map label placement")]
struct Args {
    /// Config JSON file (defaults to the platform config dir)
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    /// trace, debug, info, warn or error (overrides LOG_LEVEL)
    #[arg(long = "log-level", global = true)]
    log_level: Option<String>,

    /// Directory holding saved layouts
    #[arg(long = "store-dir", global = true)]
    store_dir: Option<PathBuf>,

    #[arg(long = "project", global = true)]
    project: Option<String>,

    #[arg(long = "map-config", global = true)]
    map_config: Option<String>,

    #[arg(long = "map-type", global = true)]
    map_type: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Place a JSON array of label requests and print their offsets
    Layout {
        requests: PathBuf,

        /// Store the resulting placements for the scope
        #[arg(long)]
        save: bool,
    },
    /// Print the stored placements for the scope
    Show,
    /// Forget stored placements for the scope, or for one label
    Reset {
        #[arg(long)]
        label: Option<String>,
    },
    /// Write the default config file
    InitConfig,
}

fn parse_level(name: &str) -> TraceLevel {
    match name.to_lowercase().as_str() {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load_from(path),
        None => EngineConfig::load(),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = match args.command {
        Command::InitConfig => EngineConfig::default(),
        _ => load_config(args.config.as_deref())?,
    };

    // Flag beats LOG_LEVEL, which beats the config file
    let level_name = args
        .log_level
        .clone()
        .or_else(|| std::env::var("LOG_LEVEL").ok())
        .unwrap_or_else(|| config.log_level.clone());
    let subscriber = FmtSubscriber::builder().with_max_level(parse_level(&level_name)).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Some(dir) = &args.store_dir {
        config.storage_dir = Some(dir.clone());
    }
    let scope = Scope::new(args.project.clone(), args.map_config.clone(), args.map_type.clone());
    info!(scope = %scope, profile = config.profile.name(), "Starting");

    match &args.command {
        Command::Layout { requests, save } => run_layout(config, scope, requests, *save),
        Command::Show => run_show(&config, &scope),
        Command::Reset { label } => run_reset(config, scope, label.as_deref()),
        Command::InitConfig => run_init_config(args.config.as_deref()),
    }
}

fn build_engine(config: EngineConfig, scope: Scope) -> LabelEngine<MemorySurface> {
    let measurer = build_measurer(config.font_path.as_deref());
    let store = FileStore::new(config.resolved_storage_dir());
    LabelEngine::new(config, scope, measurer, Box::new(store), Instant::now())
}

fn run_layout(config: EngineConfig, scope: Scope, path: &Path, save: bool) -> Result<()> {
    let contents = fs::read_to_string(path).with_context(|| format!("Failed to read requests from {}", path.display()))?;
    let requests: Vec<LabelRequest> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse label requests from {}", path.display()))?;

    let mut engine = build_engine(config, scope);
    let attached = engine.attach_surface(MemorySurface::new());
    if !attached.success {
        bail!("{}", attached.message);
    }

    let ids = engine.process_batch(&requests);
    if ids.len() != requests.len() {
        warn!(requests = requests.len(), placed = ids.len(), "Some requests had no usable identity");
    }
    for id in &ids {
        if let Some(offset) = engine.offset(id) {
            println!("{}\t{:.3}\t{:.3}", id, offset.x, offset.y);
        }
    }

    let stats = engine.stats();
    info!(
        labels = stats.labels,
        overlapping_after = stats.overlapping_after,
        global_pass = stats.global_pass,
        "Layout finished"
    );

    if save {
        let saved = engine.save(true, Instant::now());
        if !saved.success {
            bail!("{}", saved.message);
        }
        info!(message = %saved.message, "Layout saved");
    }
    Ok(())
}

fn run_show(config: &EngineConfig, scope: &Scope) -> Result<()> {
    let store = PersistenceStore::new(
        Box::new(FileStore::new(config.resolved_storage_dir())),
        config.storage_base_key.clone(),
    );
    let mut records = store.load(scope)?;
    records.sort_by(|a, b| a.label_id.cmp(&b.label_id));
    for record in records {
        println!(
            "{}\t{:.3}\t{:.3}\t{}\t{:?}\t{}",
            record.label_id,
            record.offset.x,
            record.offset.y,
            record.font_size,
            record.font_weight,
            if record.visible { "visible" } else { "hidden" }
        );
    }
    Ok(())
}

fn run_reset(config: EngineConfig, scope: Scope, label: Option<&str>) -> Result<()> {
    match label {
        Some(label) => {
            let mut store = PersistenceStore::new(
                Box::new(FileStore::new(config.resolved_storage_dir())),
                config.storage_base_key.clone(),
            );
            let removed = store.remove(&scope, &[LabelId::new(label)])?;
            info!(label = label, removed = removed, "Label reset");
        }
        None => {
            let outcome = build_engine(config, scope).reset();
            if !outcome.success {
                bail!("{}", outcome.message);
            }
            info!(message = %outcome.message, "Scope reset");
        }
    }
    Ok(())
}

fn run_init_config(path: Option<&Path>) -> Result<()> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(EngineConfig::path);
    if path.exists() {
        info!(path = %path.display(), "Config already exists, leaving it untouched");
        return Ok(());
    }
    EngineConfig::default().save_to(&path)
}
