//! Offline export and merge between two copies of a ledger
//!
//! An export carries only the newest transactions plus a CRC32 of the
//! sender's complete history. The receiver rebuilds the sender's full log
//! from its own first lines and the exported tail; if the checksum matches,
//! both sides agree on the shared prefix and the tail can be trusted.
//!
//! Merging never changes the receiving ledger. It returns a fresh ledger
//! replayed from the union of both histories, which the caller may accept or
//! drop.

mod frame;

pub use frame::{decode_blob, encode_blob, ExportHeader, Framing, HEADER_LEN, MAX_DECOMPRESSED_SIZE};

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};
use tracing::{info, warn};

use crate::codec;
use crate::error::{LedgerError, LedgerResult, MergeError};
use crate::ledger::Ledger;
use crate::models::Transaction;

/// Outcome of [`Ledger::merge`]
///
/// On success `new_ledger` holds the merged ledger and `message` lists the
/// transactions it adds. On failure `new_ledger` is `None` and `message`
/// says why.
#[derive(Debug, Clone)]
pub struct MergeResult {
    pub new_ledger: Option<Ledger>,
    pub message: String,
}

impl MergeResult {
    pub fn is_merged(&self) -> bool {
        self.new_ledger.is_some()
    }
}

impl From<Result<(Ledger, String), MergeError>> for MergeResult {
    fn from(result: Result<(Ledger, String), MergeError>) -> Self {
        match result {
            Ok((ledger, message)) => Self {
                new_ledger: Some(ledger),
                message,
            },
            Err(e) => Self {
                new_ledger: None,
                message: e.to_string(),
            },
        }
    }
}

/// Export sizes worth offering: 1, 2, 4, ... up to `history_size`, then
/// `history_size` itself
pub fn export_size_options(history_size: usize) -> Vec<usize> {
    let mut options = Vec::new();
    let mut size = 1;
    while size <= history_size {
        options.push(size);
        size *= 2;
    }
    if history_size > 0 && options.last() != Some(&history_size) {
        options.push(history_size);
    }
    options
}

impl Ledger {
    /// Export the newest `count` transactions, compressing when it helps
    pub fn export(&self, count: usize) -> LedgerResult<String> {
        self.export_with(count, true)
    }

    /// Export the newest `count` transactions
    ///
    /// `count` must be between 1 and the history size, and the remaining
    /// unexported prefix must be shorter than 65536 transactions.
    pub fn export_with(&self, count: usize, compress: bool) -> LedgerResult<String> {
        let size = self.history_size();
        if count == 0 || count > size {
            return Err(LedgerError::InvalidExportSize {
                requested: count,
                available: size,
            });
        }
        let unexported = size - count;
        let unexported_field =
            u16::try_from(unexported).map_err(|_| LedgerError::TooManyUnexported(unexported))?;

        let text = self.save();
        let header = ExportHeader {
            unexported: unexported_field,
            crc: crc32fast::hash(text.as_bytes()),
        };
        let tail = &text.as_bytes()[tail_offset(&text, unexported)..];

        let blob = encode_blob(&header, tail, compress)?;
        info!(
            exported = count,
            unexported,
            crc = header.crc,
            encoded_len = blob.len(),
            "exported history tail"
        );
        Ok(blob)
    }

    /// Merge an export blob, reporting failure as a message
    pub fn merge(&self, blob: &str) -> MergeResult {
        self.try_merge(blob).into()
    }

    /// Merge an export blob into a new ledger
    ///
    /// Returns the merged ledger and a message listing the transactions it
    /// adds, oldest first.
    pub fn try_merge(&self, blob: &str) -> Result<(Ledger, String), MergeError> {
        let result = self.merge_inner(blob);
        match &result {
            Ok((merged, _)) => info!(
                local = self.history_size(),
                merged = merged.history_size(),
                "merged remote history"
            ),
            Err(e) => warn!(reason = %e, "merge rejected"),
        }
        result
    }

    fn merge_inner(&self, blob: &str) -> Result<(Ledger, String), MergeError> {
        let (header, tail, _) = decode_blob(blob)?;

        let unexported = usize::from(header.unexported);
        if unexported > self.history_size() {
            return Err(MergeError::NeedMoreContext {
                unexported,
                local: self.history_size(),
            });
        }

        let mut remote_log = codec::encode_history(&self.history()[..unexported]).into_bytes();
        remote_log.extend_from_slice(&tail);

        let actual = crc32fast::hash(&remote_log);
        if actual != header.crc {
            warn!(
                unexported,
                expected = header.crc,
                actual,
                "checksum mismatch on reconstructed log"
            );
            return Err(MergeError::ConflictOrCorrupt {
                expected: header.crc,
                actual,
            });
        }

        let remote_text = String::from_utf8(remote_log)
            .map_err(|e| MergeError::InvalidRemoteLog(e.to_string()))?;
        let remote =
            Ledger::load(&remote_text).map_err(|e| MergeError::InvalidRemoteLog(e.to_string()))?;

        if !strictly_increasing(self.history()) {
            return Err(MergeError::DateOrderViolation);
        }
        if !strictly_increasing(remote.history()) {
            return Err(MergeError::RemoteDateOrderViolation);
        }

        let mut union: BTreeMap<i64, &Transaction> = BTreeMap::new();
        for txn in self.history().iter().chain(remote.history()) {
            match union.entry(txn.date()) {
                Entry::Vacant(slot) => {
                    slot.insert(txn);
                }
                Entry::Occupied(existing) => {
                    if *existing.get() != txn {
                        return Err(MergeError::DateConflict { date: txn.date() });
                    }
                }
            }
        }

        if union.len() == self.history_size() {
            return Err(MergeError::NothingNew);
        }

        let mut merged = Ledger::new();
        for txn in union.values() {
            merged
                .apply((*txn).clone())
                .map_err(|e| MergeError::InvalidMergedLog(e.to_string()))?;
        }

        let local_dates: HashSet<i64> = self.history().iter().map(|t| t.date()).collect();
        let mut message = String::from("New Transactions:\n");
        for txn in merged.history() {
            if !local_dates.contains(&txn.date()) {
                message.push_str(&txn.describe());
                message.push('\n');
            }
        }

        Ok((merged, message))
    }
}

/// Byte offset just past the first `lines` newline-terminated lines
fn tail_offset(text: &str, lines: usize) -> usize {
    if lines == 0 {
        return 0;
    }
    text.match_indices('\n')
        .nth(lines - 1)
        .map(|(i, _)| i + 1)
        .unwrap_or(text.len())
}

fn strictly_increasing(history: &[Transaction]) -> bool {
    history.windows(2).all(|w| w[0].date() < w[1].date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use base64::{engine::general_purpose::STANDARD, Engine};

    const T0: i64 = 1_357_387_200_000;

    fn eaters(list: &[&str]) -> Vec<String> {
        list.iter().map(|n| n.to_string()).collect()
    }

    /// A, B, C and one lunch, with dates T0+1 ..= T0+4
    fn base() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.apply(Transaction::add(T0 + 1, "A", "a@x").unwrap()).unwrap();
        ledger.apply(Transaction::add(T0 + 2, "B", "b@x").unwrap()).unwrap();
        ledger.apply(Transaction::add(T0 + 3, "C", "c@x").unwrap()).unwrap();
        ledger
            .apply(
                Transaction::lunch(T0 + 4, "A", Money::from_cents(900), "", eaters(&["A", "B", "C"]))
                    .unwrap(),
            )
            .unwrap();
        ledger
    }

    fn transfer(date: i64, from: &str, to: &str, cents: i64) -> Transaction {
        Transaction::transfer(date, from, to, Money::from_cents(cents), "").unwrap()
    }

    #[test]
    fn test_export_size_options() {
        assert_eq!(export_size_options(0), Vec::<usize>::new());
        assert_eq!(export_size_options(1), vec![1]);
        assert_eq!(export_size_options(4), vec![1, 2, 4]);
        assert_eq!(export_size_options(6), vec![1, 2, 4, 6]);
    }

    #[test]
    fn test_export_bounds() {
        let ledger = base();
        assert_eq!(
            ledger.export(0).unwrap_err(),
            LedgerError::InvalidExportSize {
                requested: 0,
                available: 4
            }
        );
        assert!(ledger.export(5).is_err());
        assert!(ledger.export(4).is_ok());
        assert!(Ledger::new().export(1).is_err());
    }

    #[test]
    fn test_export_layout() {
        let ledger = base();
        let blob = ledger.export_with(2, false).unwrap();
        let raw = STANDARD.decode(blob).unwrap();

        let text = ledger.save();
        assert_eq!(&raw[..2], b"L0");
        assert_eq!(&raw[2..4], &2u16.to_be_bytes());
        assert_eq!(&raw[4..8], &crc32fast::hash(text.as_bytes()).to_be_bytes());

        let lines: Vec<&str> = text.lines().collect();
        let expected_tail = format!("{}\n{}\n", lines[2], lines[3]);
        assert_eq!(&raw[8..], expected_tail.as_bytes());
    }

    #[test]
    fn test_merge_own_export_is_nothing_new() {
        let ledger = base();
        for count in 1..=ledger.history_size() {
            for compress in [false, true] {
                let blob = ledger.export_with(count, compress).unwrap();
                assert_eq!(ledger.try_merge(&blob).unwrap_err(), MergeError::NothingNew);
            }
        }
    }

    #[test]
    fn test_merge_result_reports_message() {
        let ledger = base();
        let result = ledger.merge(&ledger.export(1).unwrap());
        assert!(!result.is_merged());
        assert_eq!(result.message, "Nothing new");

        let garbage = ledger.merge("@@@@");
        assert!(garbage.new_ledger.is_none());
        assert!(garbage.message.starts_with("Invalid Data Format"));
    }

    #[test]
    fn test_fast_forward_merge() {
        let receiver = base();
        let mut sender = base();
        sender.apply(transfer(T0 + 10, "B", "A", 300)).unwrap();
        sender.apply(transfer(T0 + 11, "C", "A", 300)).unwrap();

        let blob = sender.export(2).unwrap();
        let (merged, message) = receiver.try_merge(&blob).unwrap();

        assert_eq!(merged.history_size(), 6);
        assert_eq!(merged.save(), sender.save());
        assert!(merged.is_modified());
        assert_eq!(
            message,
            "New Transactions:\nB gave $3.00 to A on Jan 5, 2013\nC gave $3.00 to A on Jan 5, 2013\n"
        );
        // the receiver itself is untouched
        assert_eq!(receiver.history_size(), 4);
    }

    #[test]
    fn test_diverged_histories_union() {
        let mut left = base();
        let mut right = base();
        left.apply(transfer(T0 + 10, "B", "A", 100)).unwrap();
        left.apply(transfer(T0 + 30, "B", "C", 50)).unwrap();
        right.apply(transfer(T0 + 20, "C", "A", 200)).unwrap();

        // right sends everything after the shared prefix
        let blob = right.export(1).unwrap();
        let (merged, message) = left.try_merge(&blob).unwrap();

        let dates: Vec<i64> = merged.history().iter().map(|t| t.date()).collect();
        assert_eq!(
            dates,
            vec![T0 + 1, T0 + 2, T0 + 3, T0 + 4, T0 + 10, T0 + 20, T0 + 30]
        );
        assert_eq!(message.lines().count(), 2);
        assert!(message.contains("C gave $2.00 to A"));

        let replayed = Ledger::load(&merged.save()).unwrap();
        for name in ["A", "B", "C"] {
            assert_eq!(
                merged.get_person(name).unwrap().balance,
                replayed.get_person(name).unwrap().balance
            );
        }
        assert!(merged.total_balance().is_zero());
    }

    #[test]
    fn test_diverged_prefix_needs_shared_context() {
        let mut left = base();
        let mut right = base();
        left.apply(transfer(T0 + 10, "B", "A", 100)).unwrap();
        right.apply(transfer(T0 + 20, "C", "A", 200)).unwrap();
        right.apply(transfer(T0 + 21, "C", "B", 200)).unwrap();

        // right's unexported prefix is 4 lines, which left shares
        assert!(left.try_merge(&right.export(2).unwrap()).is_ok());

        // exporting only the last one assumes left has right's T0+20 line
        assert!(matches!(
            left.try_merge(&right.export(1).unwrap()).unwrap_err(),
            MergeError::ConflictOrCorrupt { .. }
        ));
    }

    #[test]
    fn test_need_more_context() {
        let mut sender = base();
        for i in 0..5 {
            sender.apply(transfer(T0 + 10 + i, "B", "A", 10)).unwrap();
        }
        let receiver = Ledger::new();
        let blob = sender.export(2).unwrap();
        assert_eq!(
            receiver.try_merge(&blob).unwrap_err(),
            MergeError::NeedMoreContext {
                unexported: 7,
                local: 0
            }
        );
    }

    #[test]
    fn test_tampered_tail_is_detected() {
        let mut sender = base();
        sender.apply(transfer(T0 + 10, "B", "A", 300)).unwrap();
        let blob = sender.export_with(2, false).unwrap();
        let raw = STANDARD.decode(&blob).unwrap();

        for index in HEADER_LEN..raw.len() {
            let mut tampered = raw.clone();
            tampered[index] ^= 0x01;
            let err = base().try_merge(&STANDARD.encode(&tampered)).unwrap_err();
            assert!(
                matches!(err, MergeError::ConflictOrCorrupt { .. }),
                "byte {} gave {:?}",
                index,
                err
            );
        }
    }

    #[test]
    fn test_tampered_compressed_tail_is_detected() {
        let mut sender = base();
        for i in 0..20 {
            sender.apply(transfer(T0 + 10 + i, "B", "A", 300)).unwrap();
        }
        let blob = sender.export_with(21, true).unwrap();
        let (header, tail, framing) = decode_blob(&blob).unwrap();
        assert_eq!(framing, Framing::Gzip);

        for index in (0..tail.len()).step_by(7) {
            let mut tampered = tail.clone();
            tampered[index] ^= 0x01;
            let reframed = encode_blob(&header, &tampered, true).unwrap();
            assert_eq!(decode_blob(&reframed).unwrap().2, Framing::Gzip);

            let err = base().try_merge(&reframed).unwrap_err();
            assert!(
                matches!(err, MergeError::ConflictOrCorrupt { .. }),
                "byte {} gave {:?}",
                index,
                err
            );
        }

        // damage to the gzip stream itself never reaches the checksum
        let mut raw = STANDARD.decode(&blob).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xff;
        assert!(matches!(
            base().try_merge(&STANDARD.encode(&raw)).unwrap_err(),
            MergeError::InvalidFormat(_)
        ));
    }

    #[test]
    fn test_overflowing_remote_log_is_rejected() {
        let text = "1\tadd\tA\t\n2\tadd\tB\t\n\
                    3\ttransfer\tA\tB\t9223372036854775807\tx\n\
                    4\ttransfer\tA\tB\t1\tx\n";
        let header = ExportHeader {
            unexported: 0,
            crc: crc32fast::hash(text.as_bytes()),
        };
        for compress in [false, true] {
            let blob = encode_blob(&header, text.as_bytes(), compress).unwrap();
            assert!(matches!(
                Ledger::new().try_merge(&blob).unwrap_err(),
                MergeError::InvalidRemoteLog(_)
            ));
        }
    }

    #[test]
    fn test_overflowing_union_is_rejected() {
        // each side fits on its own, both together do not
        let half = i64::MAX / 2;
        let mut left = base();
        let mut right = base();
        left.apply(transfer(T0 + 10, "B", "A", half)).unwrap();
        right.apply(transfer(T0 + 20, "B", "A", half)).unwrap();

        assert!(matches!(
            left.try_merge(&right.export(1).unwrap()).unwrap_err(),
            MergeError::InvalidMergedLog(_)
        ));
    }

    #[test]
    fn test_same_date_conflict() {
        let mut left = base();
        let mut right = base();
        left.apply(transfer(T0 + 10, "B", "A", 100)).unwrap();
        right.apply(transfer(T0 + 10, "C", "A", 100)).unwrap();

        assert_eq!(
            left.try_merge(&right.export(1).unwrap()).unwrap_err(),
            MergeError::DateConflict { date: T0 + 10 }
        );
    }

    #[test]
    fn test_local_date_order_violation() {
        let mut local = Ledger::new();
        local.apply(Transaction::add(T0 + 5, "A", "a@x").unwrap()).unwrap();
        local.apply(Transaction::add(T0 + 5, "B", "b@x").unwrap()).unwrap();

        let mut remote = Ledger::load(&local.save()).unwrap();
        remote.apply(Transaction::add(T0 + 9, "C", "c@x").unwrap()).unwrap();

        assert_eq!(
            local.try_merge(&remote.export(1).unwrap()).unwrap_err(),
            MergeError::DateOrderViolation
        );
    }

    #[test]
    fn test_remote_date_order_violation() {
        let local = base();
        let mut remote = base();
        remote.apply(transfer(T0 + 2, "B", "A", 100)).unwrap();

        assert_eq!(
            local.try_merge(&remote.export(1).unwrap()).unwrap_err(),
            MergeError::RemoteDateOrderViolation
        );
    }

    #[test]
    fn test_invalid_remote_log() {
        let local = Ledger::new();
        let text = "1\tadd\tA\ta@x\n2\tpay\tA\n";
        let header = ExportHeader {
            unexported: 0,
            crc: crc32fast::hash(text.as_bytes()),
        };
        let blob = encode_blob(&header, text.as_bytes(), false).unwrap();
        assert!(matches!(
            local.try_merge(&blob).unwrap_err(),
            MergeError::InvalidRemoteLog(_)
        ));
    }

    #[test]
    fn test_invalid_merged_log() {
        // D comes and goes on the left and comes back on the right
        let mut left = base();
        let mut right = base();
        left.apply(Transaction::add(T0 + 10, "D", "d@x").unwrap()).unwrap();
        left.apply(Transaction::delete(T0 + 11, "D", "d@x").unwrap()).unwrap();
        right.apply(transfer(T0 + 12, "D", "A", 100)).unwrap_err();
        right.apply(Transaction::add(T0 + 12, "E", "e@x").unwrap()).unwrap();
        right.apply(Transaction::add(T0 + 13, "D", "dee@x").unwrap()).unwrap();
        right.apply(transfer(T0 + 14, "D", "A", 100)).unwrap();

        // union: add D, delete D, add E, add D, transfer: replays fine
        assert!(left.try_merge(&right.export(3).unwrap()).is_ok());

        let mut clash = base();
        clash.apply(Transaction::add(T0 + 9, "D", "other@x").unwrap()).unwrap();
        // both sides add D with nothing in between
        assert!(matches!(
            clash.try_merge(&right.export(3).unwrap()).unwrap_err(),
            MergeError::InvalidMergedLog(_)
        ));
    }
}
