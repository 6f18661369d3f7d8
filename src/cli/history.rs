//! CLI commands for reading history and the audit journal

use std::collections::BTreeSet;

use super::Session;
use crate::audit::AuditLogger;
use crate::config::LunchPaths;
use crate::error::{LedgerError, LedgerResult};

/// Handle the history command
///
/// `group` is a comma separated list of names.
pub fn handle_history_command(
    session: &Session,
    person: Option<&str>,
    group: Option<&str>,
    reverse: bool,
) -> LedgerResult<()> {
    let ledger = &session.ledger;

    let output = match (person, group) {
        (Some(name), _) => {
            if ledger.get_person(name).is_none() {
                return Err(LedgerError::person_not_found(name));
            }
            ledger.show_person_history(reverse, name)
        }
        (None, Some(group)) => {
            let selected: BTreeSet<String> = group
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect();
            if selected.is_empty() {
                return Err(LedgerError::invalid("--group needs at least one name"));
            }
            ledger.show_group_history(reverse, &selected)?
        }
        (None, None) => ledger.show_history(reverse),
    };

    if output.is_empty() {
        println!("No transactions yet.");
    } else {
        print!("{}", output);
    }
    Ok(())
}

/// Handle the audit command: print the newest `count` journal entries
pub fn handle_audit_command(paths: &LunchPaths, count: usize) -> LedgerResult<()> {
    let logger = AuditLogger::new(paths.audit_log());
    let entries = logger.read_recent(count)?;

    if entries.is_empty() {
        println!("Audit log is empty.");
        return Ok(());
    }

    for entry in entries {
        println!("{}", entry.format_human_readable());
    }
    Ok(())
}
