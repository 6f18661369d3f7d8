//! Person CLI commands
//!
//! Implements CLI commands for managing fund members.

use clap::Subcommand;

use super::Session;
use crate::display::{format_people_list, format_person_details};
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::SortMode;

/// Person subcommands
#[derive(Subcommand)]
pub enum PersonCommands {
    /// Add a new person to the fund
    Add {
        /// Person name (unique)
        name: String,
        /// Contact email
        #[arg(short, long, default_value = "")]
        email: String,
    },
    /// Remove a person whose balance is zero
    Delete {
        /// Person name
        name: String,
    },
    /// Change a person's email
    Email {
        /// Person name
        name: String,
        /// New email
        email: String,
    },
    /// List everyone with their balance
    List {
        /// Sort order (name, balance, frequency); defaults to the configured order
        #[arg(short, long, value_enum)]
        sort: Option<SortMode>,
    },
    /// Show one person's details
    Show {
        /// Person name
        name: String,
    },
}

/// Handle a person command
pub fn handle_person_command(session: &mut Session, cmd: PersonCommands) -> LedgerResult<()> {
    match cmd {
        PersonCommands::Add { name, email } => {
            session.ledger.perform_add_person(&name, &email)?;
            session.record_last_applied();
            println!("Added {} <{}>", name, email);
        }

        PersonCommands::Delete { name } => {
            session.ledger.perform_delete_person(&name)?;
            session.record_last_applied();
            println!("Deleted {}", name);
        }

        PersonCommands::Email { name, email } => {
            session.ledger.perform_change_email(&name, &email)?;
            session.record_last_applied();
            println!("{}'s email is now {}", name, email);
        }

        PersonCommands::List { sort } => {
            let mode = sort.unwrap_or(session.settings.default_sort);
            let people = session.ledger.list_people(mode);
            let table = format_people_list(&people, &session.settings.currency_symbol);
            println!("{}", table.trim_end());
        }

        PersonCommands::Show { name } => {
            let person = session
                .ledger
                .get_person(&name)
                .ok_or_else(|| LedgerError::person_not_found(&name))?;
            print!(
                "{}",
                format_person_details(person, &session.settings.currency_symbol)
            );
        }
    }

    Ok(())
}
