//! `gitdocdb` — a thin command-line front end over the [`gitdocdb`] library.
//!
//! Intentionally minimal: it is not a feature surface in its own right and
//! carries no subcommands beyond the five lifecycle operations a database
//! handle exposes (open, put, get, sync, close).

use std::io::Read as _;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use gitdocdb::{Database, DatabaseOptions};

#[derive(Parser)]
#[command(name = "gitdocdb")]
#[command(version, about = "Offline-first, versioned JSON document database backed by Git")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open (creating if necessary) the database, bootstrapping its first commits.
    Open(CommonArgs),

    /// Insert or update a document.
    Put(PutArgs),

    /// Read a document by id.
    Get(GetArgs),

    /// Run one sync cycle against the configured remote.
    Sync(CommonArgs),

    /// Drain the task queue and release this process's claim on the database.
    Close(CloseArgs),
}

#[derive(Args)]
struct CommonArgs {
    /// Path to a gitdocdb.toml config file (configuration options).
    #[arg(long)]
    config: Option<PathBuf>,

    /// The local working directory. Overrides the config file's `local_dir`.
    #[arg(long)]
    dir: Option<PathBuf>,

    /// The database's logical name. Overrides the config file's `db_name`.
    #[arg(long = "db-name")]
    db_name: Option<String>,
}

#[derive(Args)]
struct PutArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// JSON document body. Reads from stdin if omitted.
    json: Option<String>,
}

#[derive(Args)]
struct GetArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// The document id to read.
    id: String,
}

#[derive(Args)]
struct CloseArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// How long to wait for the task queue to drain before giving up.
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    /// Cancel any still-pending tasks instead of failing once `timeout_secs` elapses.
    #[arg(long)]
    force: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Open(args) => run_open(&args),
        Commands::Put(args) => run_put(&args),
        Commands::Get(args) => run_get(&args),
        Commands::Sync(args) => run_sync(&args),
        Commands::Close(args) => run_close(&args),
    }
}

fn load_options(common: &CommonArgs) -> Result<DatabaseOptions> {
    let mut options = match &common.config {
        Some(path) => DatabaseOptions::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?
            .with_context(|| format!("config file not found: {}", path.display()))?,
        None => {
            let dir = common
                .dir
                .clone()
                .context("--dir is required when --config is not given")?;
            let db_name = common.db_name.clone().unwrap_or_else(|| "gitdocdb".to_owned());
            DatabaseOptions::new(db_name, dir)
        }
    };
    if let Some(dir) = &common.dir {
        options.local_dir = dir.clone();
    }
    if let Some(db_name) = &common.db_name {
        options.db_name = db_name.clone();
    }
    Ok(options)
}

fn run_open(args: &CommonArgs) -> Result<()> {
    let options = load_options(args)?;
    let local_dir = options.local_dir.clone();
    let db = Database::open(options).context("opening database")?;
    println!("opened database at {}", local_dir.display());
    db.close(Duration::from_secs(30), false).context("closing database")?;
    Ok(())
}

fn run_put(args: &PutArgs) -> Result<()> {
    let options = load_options(&args.common)?;
    let body = match &args.json {
        Some(json) => json.clone(),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading document body from stdin")?;
            buf
        }
    };
    let doc: serde_json::Value = serde_json::from_str(&body).context("parsing document body as JSON")?;

    let db = Database::open(options).context("opening database")?;
    let id = db.put(doc).context("putting document")?;
    println!("{id}");
    db.close(Duration::from_secs(30), false).context("closing database")?;
    Ok(())
}

fn run_get(args: &GetArgs) -> Result<()> {
    let options = load_options(&args.common)?;
    let db = Database::open(options).context("opening database")?;
    match db.get(&args.id).context("reading document")? {
        Some(doc) => {
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        None => bail!("document '{}' not found", args.id),
    }
    db.close(Duration::from_secs(30), false).context("closing database")?;
    Ok(())
}

fn run_sync(args: &CommonArgs) -> Result<()> {
    let options = load_options(args)?;
    let db = Database::open(options).context("opening database")?;
    let result = db.try_sync().context("syncing database")?;
    println!("{}", result.action.map(|a| a.as_str()).unwrap_or("nop"));
    db.close(Duration::from_secs(30), false).context("closing database")?;
    Ok(())
}

fn run_close(args: &CloseArgs) -> Result<()> {
    let options = load_options(&args.common)?;
    let db = Database::open(options).context("opening database")?;
    db.close(Duration::from_secs(args.timeout_secs), args.force)
        .context("closing database")?;
    println!("closed");
    Ok(())
}
