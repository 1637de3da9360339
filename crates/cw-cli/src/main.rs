//! Cookiewatch CLI
//!
//! Runs the popup controller and badge aggregator against a cookie fixture
//! and a JSON list store, and edits the store.

mod fixture;
mod inspect;
mod watch;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cw_core::store::{edit_list, load_lists, TermEdit};
use cw_core::ListKey;

use fixture::FileStore;
use inspect::{run_badge, run_inspect, InspectOptions};
use watch::{parse_list_key, run_watch, WatchOptions};

#[derive(Parser)]
#[command(name = "cw-cli")]
#[command(about = "Cookiewatch cookie inspector and list tools")]
struct Cli {
    /// Term list store (JSON object)
    #[arg(short, long, global = true, default_value = "lists.json")]
    store: String,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what the popup would show for a URL
    Inspect {
        /// Cookie fixture (JSON array of cookie objects)
        #[arg(short, long)]
        cookies: String,

        /// Tab URL
        #[arg(short, long)]
        url: String,

        /// Filter by name or value
        #[arg(long)]
        search: Option<String>,

        /// Print every attribute of each cookie
        #[arg(short, long)]
        details: bool,
    },

    /// Compute the action badge for a URL
    Badge {
        #[arg(short, long)]
        cookies: String,

        #[arg(short, long)]
        url: String,
    },

    /// Show or edit the term lists
    Lists {
        #[command(subcommand)]
        action: ListAction,
    },

    /// Run the background aggregator and edit lists from stdin
    Watch {
        #[arg(short, long)]
        cookies: String,

        #[arg(short, long)]
        url: String,
    },
}

#[derive(Subcommand)]
enum ListAction {
    /// Print all four lists
    Show,
    /// Add a term
    Add {
        /// blacklist or greylist
        list: String,
        /// names or values
        field: String,
        term: String,
    },
    /// Remove a term (exact match)
    Remove {
        list: String,
        field: String,
        term: String,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Inspect {
            cookies,
            url,
            search,
            details,
        } => run_inspect(InspectOptions {
            store: cli.store,
            cookies,
            url,
            search,
            details,
        }),
        Commands::Badge { cookies, url } => run_badge(&cli.store, &cookies, &url),
        Commands::Lists { action } => cmd_lists(&cli.store, action),
        Commands::Watch { cookies, url } => run_watch(WatchOptions {
            store: cli.store,
            cookies,
            url,
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn cmd_lists(store_path: &str, action: ListAction) -> Result<(), String> {
    let store = FileStore::new(store_path);
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start tokio runtime: {}", e))?;

    let (key, edit) = match action {
        ListAction::Show => {
            let lists = rt.block_on(load_lists(&store)).map_err(|e| e.to_string())?;
            for key in ListKey::ALL {
                let list = lists.get(key);
                println!("{} ({})", key.label(), list.len());
                for term in list.iter() {
                    println!("  {}", term);
                }
            }
            return Ok(());
        }
        ListAction::Add { list, field, term } => {
            (parse_list_key(&list, &field)?, TermEdit::Add(term))
        }
        ListAction::Remove { list, field, term } => {
            (parse_list_key(&list, &field)?, TermEdit::Remove(term))
        }
    };

    let before = rt
        .block_on(load_lists(&store))
        .map_err(|e| e.to_string())?
        .get(key)
        .len();
    let after = rt
        .block_on(edit_list(&store, key, &edit))
        .map_err(|e| e.to_string())?;

    if after.len() == before {
        println!("{}: unchanged", key.storage_key());
    } else {
        println!("{}: {} -> {} terms", key.storage_key(), before, after.len());
    }
    Ok(())
}
