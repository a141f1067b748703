#![forbid(unsafe_code)]

mod menu;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use roster_core::{Record, RecordPatch};
use roster_engine::settings::{self, ConfigFile, Settings};
use roster_engine::Store;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "roster",
    version,
    about = "Student records kept in a JSON file. Runs an interactive menu when no command is given."
)]
struct Cli {
    /// Path to the student file (default: .roster/config.json, then students.json).
    #[arg(long, global = true, env = "ROSTER_FILE")]
    file: Option<PathBuf>,

    /// Debug logging on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Option<Cmd>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Interactive menu: add, update, delete, list, exit.
    Menu,

    /// Add a student. Fails if the ID already exists.
    Add {
        id: String,
        name: String,
        #[arg(allow_negative_numbers = true, value_parser = menu::parse_grade)]
        grade: f64,
    },

    /// Change a student's name and/or grade.
    Update {
        id: String,

        /// New name (an empty string is a valid name).
        #[arg(long)]
        name: Option<String>,

        /// New grade.
        #[arg(long, allow_negative_numbers = true, value_parser = menu::parse_grade)]
        grade: Option<f64>,
    },

    /// Delete a student.
    Delete { id: String },

    /// List all students in insertion order.
    List {
        /// Output JSON.
        #[arg(long)]
        json: bool,
    },

    /// Validate the student file structure.
    Check {
        /// Output structured JSON report.
        #[arg(long)]
        json: bool,

        /// Fail on warnings (not just errors).
        #[arg(long)]
        strict: bool,
    },

    /// Write .roster/config.json and create an empty student file.
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let init_file = cli.file.clone();
    let settings = Settings::resolve(cli.file);
    tracing::debug!(file = %settings.file.display(), source = ?settings.source, "resolved settings");

    match cli.cmd.unwrap_or(Cmd::Menu) {
        Cmd::Menu => cmd_menu(&settings.file),
        Cmd::Add { id, name, grade } => cmd_add(&settings.file, &id, &name, grade),
        Cmd::Update { id, name, grade } => {
            cmd_update(&settings.file, &id, RecordPatch { name, grade })
        }
        Cmd::Delete { id } => cmd_delete(&settings.file, &id),
        Cmd::List { json } => cmd_list(&settings.file, json),
        Cmd::Check { json, strict } => cmd_check(&settings.file, json, strict),
        Cmd::Init => cmd_init(init_file),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("roster=debug,roster_engine=debug,roster_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn open_store(file: &Path) -> Result<Store> {
    Store::open(file).with_context(|| format!("cannot open student file {}", file.display()))
}

fn cmd_menu(file: &Path) -> Result<()> {
    let mut store = open_store(file)?;
    let stdin = io::stdin();
    let stdout = io::stdout();
    menu::Menu::new(&mut store, stdin.lock(), stdout.lock()).run()
}

fn cmd_add(file: &Path, id: &str, name: &str, grade: f64) -> Result<()> {
    let mut store = open_store(file)?;
    if !store.add(id, name, grade)? {
        bail!("ID already exists: {id}");
    }
    eprintln!("  added {id}");
    Ok(())
}

fn cmd_update(file: &Path, id: &str, patch: RecordPatch) -> Result<()> {
    if patch.is_empty() {
        bail!("specify --name and/or --grade");
    }
    let mut store = open_store(file)?;
    if !store.update(id, patch)? {
        bail!("student not found: {id}");
    }
    eprintln!("  updated {id}");
    Ok(())
}

fn cmd_delete(file: &Path, id: &str) -> Result<()> {
    let mut store = open_store(file)?;
    if !store.delete(id)? {
        bail!("student not found: {id}");
    }
    eprintln!("  deleted {id}");
    Ok(())
}

fn cmd_list(file: &Path, json_out: bool) -> Result<()> {
    let store = open_store(file)?;
    let records = store.list();
    if json_out {
        let values = records
            .iter()
            .map(Record::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        println!("{}", serde_json::to_string_pretty(&values)?);
    } else {
        roster_core::table::print_table(&records);
    }
    Ok(())
}

fn cmd_check(file: &Path, json_out: bool, strict: bool) -> Result<()> {
    let display = file.display().to_string();
    let content = std::fs::read_to_string(file)
        .map_err(|e| anyhow::anyhow!("cannot read {display}: {e}"))?;
    let data: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("{display}: invalid JSON: {e}"))?;

    let report = roster_core::schema::check(&data, &display, strict);

    if json_out {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        if report.pass {
            eprintln!("  ok  {display} ({} records)", report.records);
        } else {
            eprintln!("  FAIL {display} ({} records)", report.records);
        }
        for e in &report.errors {
            eprintln!(
                "  error {}: {} {}",
                e.code,
                e.message,
                e.path.as_deref().unwrap_or("")
            );
        }
        for w in &report.warnings {
            eprintln!(
                "  warn  {}: {} {}",
                w.code,
                w.message,
                w.path.as_deref().unwrap_or("")
            );
        }
    }

    if !report.pass {
        bail!("check failed for {display}");
    }
    Ok(())
}

fn cmd_init(cli_file: Option<PathBuf>) -> Result<()> {
    let file = cli_file.unwrap_or_else(|| PathBuf::from(settings::DEFAULT_FILE));
    let config_path = settings::write_config(
        Path::new("."),
        &ConfigFile {
            file: Some(file.clone()),
        },
    )?;
    eprintln!("created {}", config_path.display());

    if file.exists() {
        eprintln!("kept existing {}", file.display());
        return Ok(());
    }
    if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    Store::empty(&file).save()?;
    eprintln!("created {}", file.display());
    Ok(())
}
