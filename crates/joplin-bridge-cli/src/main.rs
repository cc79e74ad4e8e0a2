//! CLI entry point for the Joplin bridge (for dev and ops).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use joplin_bridge_core::app_data::log_dir;
use joplin_bridge_core::{
    app_data_dir, default_log_level, get_storage_root, init_logging, load_config,
    set_storage_root, status, watch_notes, FileId, FsStorage, Note, NoteRepository,
};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "joplin-bridge")]
#[command(about = "Read Joplin sync folders as notes")]
struct Cli {
    /// Storage root holding the users' files. Defaults to the configured root.
    #[arg(long, global = true, value_name = "PATH")]
    root: Option<PathBuf>,
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Write logs to rolling files in the app data directory instead of stderr.
    #[arg(long, global = true)]
    log_file: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Show backend status (for dev).
    Status,
    /// Show where the bridge stores its config and logs (app data directory).
    DataDir,
    /// Set and persist the storage root.
    SetRoot {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// Show the user's Joplin folders.
    Folders {
        #[arg(long)]
        user: String,
    },
    /// List the user's notes.
    List {
        #[arg(long)]
        user: String,
        /// Leave out note bodies.
        #[arg(long)]
        meta_only: bool,
        #[arg(long)]
        json: bool,
    },
    /// Show one note by storage id.
    Show {
        #[arg(long)]
        user: String,
        #[arg(value_name = "ID")]
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// List every parsed item with its type, and the files that failed to parse.
    Items {
        #[arg(long)]
        user: String,
    },
    /// Tell whether a storage id is a Joplin item of any type.
    IsItem {
        #[arg(long)]
        user: String,
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Watch the user's Joplin folder and re-list notes on change.
    Watch {
        #[arg(long)]
        user: String,
    },
}

#[derive(Serialize)]
struct NoteRow<'a> {
    id: &'a str,
    title: &'a str,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    let log_target = if cli.log_file {
        let Some(dir) = log_dir() else {
            eprintln!("Could not determine app data directory.");
            return ExitCode::FAILURE;
        };
        Some(dir)
    } else {
        None
    };
    if let Err(e) = init_logging(level, log_target.as_deref()) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command.unwrap_or(Commands::Status) {
        Commands::Status => {
            println!("Joplin bridge");
            println!("  core: {}", status());
            let config = load_config();
            println!(
                "  storage root: {}",
                config.storage_root.as_deref().unwrap_or("(not set)")
            );
            println!("  folder template: {}", config.folder_template);
        }
        Commands::DataDir => match app_data_dir() {
            Some(p) => {
                println!("{}", p.display());
                if let Some(logs) = log_dir() {
                    println!("  logs: {}", logs.display());
                }
            }
            None => eprintln!("Could not determine app data directory."),
        },
        Commands::SetRoot { path } => {
            set_storage_root(&path)?;
            println!("Storage root set to {}", path.display());
        }
        Commands::Folders { user } => {
            let repo = repository(cli.root)?;
            for folder in repo.list_folders(&user)? {
                println!("{}", repo.storage().local_path(&folder.path)?.display());
            }
        }
        Commands::List {
            user,
            meta_only,
            json,
        } => {
            let notes = repository(cli.root)?.list_notes(&user, meta_only)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&notes)?);
            } else {
                print_notes(&notes);
            }
        }
        Commands::Show { user, id, json } => {
            let repo = repository(cli.root)?;
            let Some(note) = repo.get_note(&user, &FileId::new(id.clone()))? else {
                return Err(format!("no note with id {id}").into());
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&note)?);
            } else {
                println!("# {}", note.title);
                println!();
                println!("{}", note.content.as_deref().unwrap_or(""));
            }
        }
        Commands::Items { user } => {
            let scan = repository(cli.root)?.scan_items(&user)?;
            for item in &scan.items {
                let kind = item.item.kind();
                println!(
                    "  {:<9} {:>3}  {}  {}",
                    kind.label(),
                    kind.code(),
                    item.file_id,
                    item.item.title.as_deref().unwrap_or("")
                );
            }
            for skipped in &scan.skipped {
                println!("  skipped        {}  {}", skipped.file_id, skipped.name);
            }
            println!("{} item(s), {} skipped", scan.items.len(), scan.skipped.len());
        }
        Commands::IsItem { user, id } => {
            let found = repository(cli.root)?.is_item_file(&user, &FileId::new(id))?;
            println!("{}", found);
        }
        Commands::Watch { user } => {
            let repo = repository(cli.root)?;
            println!("Watching {} (Ctrl+C to stop)", repo.folder_path(&user));
            watch_notes(repo, &user, true, |res| match res {
                Ok(notes) => {
                    let rows: Vec<NoteRow> = notes
                        .iter()
                        .map(|n| NoteRow {
                            id: n.id.as_str(),
                            title: &n.title,
                        })
                        .collect();
                    match serde_json::to_string(&rows) {
                        Ok(line) => println!("{}", line),
                        Err(e) => eprintln!("Error: {}", e),
                    }
                }
                Err(e) => eprintln!("Error: {}", e),
            })?;
        }
    }
    Ok(())
}

/// Repository over `--root`, or over the configured storage root.
fn repository(root: Option<PathBuf>) -> Result<NoteRepository<FsStorage>, String> {
    let root = root
        .or_else(get_storage_root)
        .ok_or("no storage root; pass --root or run `joplin-bridge set-root PATH`")?;
    let template = load_config().folder_template;
    Ok(NoteRepository::new(FsStorage::new(root)).with_folder_template(template))
}

fn print_notes(notes: &[Note]) {
    println!("{} note(s)", notes.len());
    for n in notes {
        let title = if n.title.chars().count() > 60 {
            format!("{}...", n.title.chars().take(60).collect::<String>())
        } else {
            n.title.clone()
        };
        println!("  {}  {}", n.id, title);
    }
}
