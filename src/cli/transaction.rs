//! CLI command handlers for money movements and undo/redo

use super::{parse_amount, Session};
use crate::audit::AuditEntry;
use crate::error::LedgerResult;

/// Handle the transfer command
pub fn handle_transfer_command(
    session: &mut Session,
    from: &str,
    to: &str,
    amount: &str,
    remarks: Option<String>,
) -> LedgerResult<()> {
    let amount = parse_amount(amount)?;
    session
        .ledger
        .perform_transfer(from, to, amount, remarks.as_deref().unwrap_or_default())?;
    session.record_last_applied();

    if let Some(txn) = session.ledger.history().last() {
        println!("{}", txn.describe());
    }
    Ok(())
}

/// Handle the lunch command
pub fn handle_lunch_command(
    session: &mut Session,
    payer: &str,
    amount: &str,
    eaters: Vec<String>,
    remarks: Option<String>,
) -> LedgerResult<()> {
    let amount = parse_amount(amount)?;
    session.ledger.perform_lunch(
        payer,
        amount,
        remarks.as_deref().unwrap_or_default(),
        eaters,
    )?;
    session.record_last_applied();

    if let Some(txn) = session.ledger.history().last() {
        println!("{}", txn.describe());
        if let Some(split) = txn.split() {
            println!("  Each share: {}", split);
        }
    }
    Ok(())
}

/// Handle the undo command
pub fn handle_undo_command(session: &mut Session) -> LedgerResult<()> {
    let txn = session.ledger.undo()?.clone();
    session.record(AuditEntry::undone(&txn));
    println!("Undid: {}", txn.describe());
    Ok(())
}

/// Handle the redo command
pub fn handle_redo_command(session: &mut Session) -> LedgerResult<()> {
    let txn = session.ledger.redo()?.clone();
    session.record(AuditEntry::redone(&txn));
    println!("Redid: {}", txn.describe());
    Ok(())
}
