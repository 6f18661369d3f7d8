//! CLI commands for exchanging history with another copy of the fund

use std::io::Read;

use anyhow::{bail, Context};

use super::Session;
use crate::audit::AuditEntry;
use crate::sync::export_size_options;

/// Width the export blob is wrapped at
const BLOB_LINE_WIDTH: usize = 76;

/// Handle the export command
///
/// Without a count (and without `--all`) the sizes worth exporting are listed.
pub fn handle_export_command(
    session: &Session,
    count: Option<usize>,
    all: bool,
) -> anyhow::Result<()> {
    let size = session.ledger.history_size();
    let count = match (count, all) {
        (_, true) => size,
        (Some(count), false) => count,
        (None, false) => {
            let options = export_size_options(size);
            if options.is_empty() {
                println!("Nothing to export.");
                return Ok(());
            }
            println!("History holds {} transactions. Export sizes:", size);
            for option in options {
                if option == size {
                    println!("  All ({})", option);
                } else {
                    println!("  {}", option);
                }
            }
            return Ok(());
        }
    };

    let blob = session
        .ledger
        .export_with(count, session.settings.compress_exports)?;
    print!("{}", wrap_blob(&blob));
    Ok(())
}

/// Handle the merge command
///
/// The blob comes from the argument or, when absent, from stdin. Unless
/// `accept` is set, only the list of new transactions is shown.
pub fn handle_merge_command(
    session: &mut Session,
    blob: Option<String>,
    accept: bool,
) -> anyhow::Result<()> {
    let blob = match blob {
        Some(blob) => blob,
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read export from stdin")?;
            input
        }
    };

    let result = session.ledger.merge(&blob);
    let Some(merged) = result.new_ledger else {
        bail!("{}", result.message);
    };

    print!("{}", result.message);
    if !accept {
        println!();
        println!("Run again with --yes to accept these transactions.");
        return Ok(());
    }

    session.ledger = merged;
    session.record(AuditEntry::merged(result.message));
    println!("Merged.");
    Ok(())
}

fn wrap_blob(blob: &str) -> String {
    let mut out = String::with_capacity(blob.len() + blob.len() / BLOB_LINE_WIDTH + 1);
    for chunk in blob.as_bytes().chunks(BLOB_LINE_WIDTH) {
        out.push_str(&String::from_utf8_lossy(chunk));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_blob() {
        let blob = "A".repeat(BLOB_LINE_WIDTH * 2 + 5);
        let wrapped = wrap_blob(&blob);
        let lines: Vec<&str> = wrapped.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), BLOB_LINE_WIDTH);
        assert_eq!(lines[2], "AAAAA");
        assert_eq!(wrapped.replace('\n', ""), blob);
    }

    #[test]
    fn test_wrap_empty_blob() {
        assert_eq!(wrap_blob(""), "");
    }
}
