use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lunch_fund::cli::{
    handle_audit_command, handle_export_command, handle_history_command, handle_lunch_command,
    handle_merge_command, handle_person_command, handle_redo_command, handle_transfer_command,
    handle_undo_command, PersonCommands, Session,
};
use lunch_fund::config::{LunchPaths, Settings};

/// Environment variable holding the log filter
const LOG_ENV: &str = "LUNCHFUND_LOG";

#[derive(Parser)]
#[command(
    name = "lunchfund",
    version,
    about = "Shared lunch fund ledger",
    long_about = "Keeps track of who paid for lunch and who owes whom. Every change is \
                  a transaction in an undoable history, and two copies of the fund \
                  can be synchronized offline by exchanging short export blobs."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory
    Init,

    /// Show current configuration and paths
    Config,

    /// Manage fund members
    #[command(subcommand)]
    Person(PersonCommands),

    /// Record that one person gave money to another
    Transfer {
        /// Who gave the money
        from: String,
        /// Who received it
        to: String,
        /// Amount (e.g., "12.50")
        amount: String,
        /// Free-text remarks
        #[arg(short, long)]
        remarks: Option<String>,
    },

    /// Record a lunch paid by one person for a group
    Lunch {
        /// Who paid
        payer: String,
        /// Total amount (e.g., "42.00")
        amount: String,
        /// Who ate, the payer included if they ate too
        #[arg(required = true, num_args = 1..)]
        eaters: Vec<String>,
        /// Free-text remarks
        #[arg(short, long)]
        remarks: Option<String>,
    },

    /// Undo the most recent transaction
    Undo,

    /// Reapply the most recently undone transaction
    Redo,

    /// Show the transaction history
    History {
        /// Only transactions involving this person, with running balances
        #[arg(short, long, conflicts_with = "group")]
        person: Option<String>,
        /// Only transactions involving these people (comma separated)
        #[arg(short, long)]
        group: Option<String>,
        /// Newest first
        #[arg(short, long)]
        reverse: bool,
    },

    /// Export the newest transactions for another copy of the fund
    Export {
        /// Number of transactions to export
        count: Option<usize>,
        /// Export the whole history
        #[arg(long, conflicts_with = "count")]
        all: bool,
    },

    /// Merge an export from another copy of the fund
    Merge {
        /// Export blob (read from stdin when omitted)
        blob: Option<String>,
        /// Accept the merge instead of only previewing it
        #[arg(short, long)]
        yes: bool,
    },

    /// Show recent audit log entries
    Audit {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "20")]
        count: usize,
    },
}

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    let paths = LunchPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    let Some(command) = cli.command else {
        println!("lunchfund - shared lunch fund ledger");
        println!();
        println!("Run 'lunchfund --help' for usage information.");
        return Ok(());
    };

    match command {
        Commands::Init => {
            if paths.is_initialized() {
                println!(
                    "Lunch fund already initialized at: {}",
                    paths.base_dir().display()
                );
                return Ok(());
            }
            println!("Initializing lunch fund at: {}", paths.base_dir().display());
            paths.ensure_directories()?;
            settings.save(&paths)?;
            println!("Initialization complete!");
            println!();
            println!("Run 'lunchfund person add NAME --email EMAIL' to add people.");
        }
        Commands::Config => {
            println!("Lunch Fund Configuration");
            println!("========================");
            println!("Data directory: {}", paths.base_dir().display());
            println!("History file:   {}", paths.history_file().display());
            println!("Redo file:      {}", paths.redo_file().display());
            println!("Audit log:      {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  Default sort:     {}", settings.default_sort);
            println!("  Compress exports: {}", settings.compress_exports);
            println!("  Audit enabled:    {}", settings.audit_enabled);
            println!("  Currency symbol:  {}", settings.currency_symbol);
        }
        Commands::Audit { count } => {
            handle_audit_command(&paths, count)?;
        }
        command => {
            let mut session = Session::open(&paths, settings)?;
            run_ledger_command(&mut session, command)?;
            session.finish()?;
        }
    }

    Ok(())
}

fn run_ledger_command(session: &mut Session, command: Commands) -> Result<()> {
    match command {
        Commands::Person(cmd) => handle_person_command(session, cmd)?,
        Commands::Transfer {
            from,
            to,
            amount,
            remarks,
        } => handle_transfer_command(session, &from, &to, &amount, remarks)?,
        Commands::Lunch {
            payer,
            amount,
            eaters,
            remarks,
        } => handle_lunch_command(session, &payer, &amount, eaters, remarks)?,
        Commands::Undo => handle_undo_command(session)?,
        Commands::Redo => handle_redo_command(session)?,
        Commands::History {
            person,
            group,
            reverse,
        } => handle_history_command(session, person.as_deref(), group.as_deref(), reverse)?,
        Commands::Export { count, all } => handle_export_command(session, count, all)?,
        Commands::Merge { blob, yes } => handle_merge_command(session, blob, yes)?,
        Commands::Init | Commands::Config | Commands::Audit { .. } => {}
    }
    Ok(())
}

/// Log to stderr, filtered by `LUNCHFUND_LOG` (default `warn`)
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
