//! History text format
//!
//! One transaction per line, tab separated, date first and kind second:
//!
//! ```text
//! <millis>\tadd\t<name>\t<email>
//! <millis>\tdelete\t<name>\t<email>
//! <millis>\ttransfer\t<from>\t<to>\t<cents>\t<remarks>
//! <millis>\tlunch\t<payer>\t<cents>\t<remarks>\t<eater>...
//! <millis>\tchemail\t<name>\t<old email>\t<new email>
//! ```
//!
//! Fields are not escaped. A tab or newline inside a name, email or remark
//! shifts the remaining fields; the format has always had this limitation.

use std::str::FromStr;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Money, Transaction};

/// Render a history as a document, every line newline-terminated
pub fn encode_history<'a, I>(history: I) -> String
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut text = String::new();
    for txn in history {
        text.push_str(&txn.to_line());
        text.push('\n');
    }
    text
}

/// Parse a whole document into transactions
///
/// Surrounding whitespace on each line is ignored and blank lines are
/// skipped. Transactions are only parsed here, not applied.
pub fn decode_history(text: &str) -> LedgerResult<Vec<Transaction>> {
    non_blank_lines(text)
        .map(|(number, line)| decode_line(number, line))
        .collect()
}

/// Trimmed, non-blank lines with their 1-based line numbers
pub(crate) fn non_blank_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
}

/// Parse a single history line
///
/// `number` is only used to locate errors.
pub fn decode_line(number: usize, line: &str) -> LedgerResult<Transaction> {
    let parse_err = |message: String| LedgerError::Parse {
        line: number,
        message,
    };

    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 2 {
        return Err(parse_err(format!("expected date and kind in {:?}", line)));
    }

    let date: i64 = fields[0]
        .parse()
        .map_err(|_| parse_err(format!("invalid date {:?}", fields[0])))?;

    let require = |count: usize| -> LedgerResult<()> {
        if fields.len() < count {
            Err(parse_err(format!(
                "{} needs at least {} fields, got {}",
                fields[1],
                count,
                fields.len()
            )))
        } else {
            Ok(())
        }
    };

    let amount = |index: usize| -> LedgerResult<Money> {
        fields[index]
            .parse::<i64>()
            .map(Money::from_cents)
            .map_err(|_| parse_err(format!("invalid amount {:?}", fields[index])))
    };

    let optional = |index: usize| fields.get(index).copied().unwrap_or("");

    let txn = match fields[1] {
        "add" => {
            require(3)?;
            Transaction::add(date, fields[2], optional(3))
        }
        "delete" => {
            require(3)?;
            Transaction::delete(date, fields[2], optional(3))
        }
        "transfer" => {
            require(5)?;
            Transaction::transfer(date, fields[2], fields[3], amount(4)?, optional(5))
        }
        "lunch" => {
            require(5)?;
            let eaters = fields[5..].iter().map(|e| e.to_string()).collect();
            Transaction::lunch(date, fields[2], amount(3)?, fields[4], eaters)
        }
        "chemail" => {
            require(3)?;
            Transaction::change_email(date, fields[2], optional(3), optional(4))
        }
        other => return Err(LedgerError::UnknownTransactionKind(other.to_string())),
    };

    txn.map_err(|e| parse_err(e.to_string()))
}

impl FromStr for Transaction {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_line(1, s.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionKind;

    #[test]
    fn test_decode_each_kind() {
        let add: Transaction = "100\tadd\tAlice\talice@x.com".parse().unwrap();
        assert_eq!(add.date(), 100);
        assert!(matches!(add.kind(), TransactionKind::Add { name, .. } if name == "Alice"));

        let delete: Transaction = "101\tdelete\tAlice\talice@x.com".parse().unwrap();
        assert_eq!(delete.kind().tag(), "delete");

        let transfer: Transaction = "102\ttransfer\tA\tB\t250\tcoffee".parse().unwrap();
        assert_eq!(transfer.effect_on("A").cents(), 250);

        let lunch: Transaction = "103\tlunch\tA\t900\tnothing\tA\tB\tC".parse().unwrap();
        assert_eq!(lunch.split().unwrap().cents(), 300);

        let chemail: Transaction = "104\tchemail\tA\told@x\tnew@x".parse().unwrap();
        assert_eq!(chemail.kind().tag(), "chemail");
    }

    #[test]
    fn test_optional_trailing_fields() {
        let add: Transaction = "100\tadd\tAlice".parse().unwrap();
        assert!(matches!(add.kind(), TransactionKind::Add { email, .. } if email.is_empty()));

        let transfer: Transaction = "102\ttransfer\tA\tB\t250".parse().unwrap();
        assert_eq!(transfer.to_line(), "102\ttransfer\tA\tB\t250\tnothing");

        // clearing an email leaves a trailing tab that trimming removes
        let cleared = Transaction::change_email(104, "A", "a@x", "").unwrap();
        let reread: Transaction = cleared.to_line().trim().parse().unwrap();
        assert_eq!(reread, cleared);
    }

    #[test]
    fn test_unknown_kind() {
        let err = decode_line(3, "100\tpay\tA\tB").unwrap_err();
        assert_eq!(err, LedgerError::UnknownTransactionKind("pay".into()));
        assert!(err.is_format());
    }

    #[test]
    fn test_malformed_lines() {
        assert!(matches!(
            decode_line(7, "abc\tadd\tA\ta@x").unwrap_err(),
            LedgerError::Parse { line: 7, .. }
        ));
        assert!(decode_line(1, "100").is_err());
        assert!(decode_line(1, "100\ttransfer\tA\tB").is_err());
        assert!(decode_line(1, "100\ttransfer\tA\tB\tlots").is_err());
        // rules of the transaction itself are format errors when loading
        assert!(matches!(
            decode_line(2, "100\tlunch\tA\t900\tnothing").unwrap_err(),
            LedgerError::Parse { line: 2, .. }
        ));
        assert!(decode_line(1, "100\ttransfer\tA\tA\t5\tx").is_err());
    }

    #[test]
    fn test_document_round_trip() {
        let text = "1\tadd\tA\ta@x\n2\tadd\tB\tb@x\n3\tlunch\tA\t1000\tnothing\tA\tB\n";
        let history = decode_history(text).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(encode_history(&history), text);
    }

    #[test]
    fn test_blank_lines_and_whitespace_are_skipped() {
        let text = "\n1\tadd\tA\ta@x\r\n\n   \n2\tadd\tB\tb@x  \n";
        let history = decode_history(text).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].to_line(), "2\tadd\tB\tb@x");
    }

    #[test]
    fn test_error_reports_line_number() {
        let text = "1\tadd\tA\ta@x\n\n3\tadd\n";
        assert!(matches!(
            decode_history(text).unwrap_err(),
            LedgerError::Parse { line: 3, .. }
        ));
    }
}
