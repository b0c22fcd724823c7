// 🧮 Tracker - Record store + persistence, one mutation at a time
//
// Every mutation works on a copy of the store, persists both collections in
// full, and only then replaces the live state. A failed save or a rejected
// import leaves the previous state untouched.

use crate::csv_codec::{self, SkippedRow};
use crate::db::{load_records, save_records, KeyValueStore};
use crate::deduplication::merge;
use crate::error::StoreError;
use crate::models::{
    RecordId, RecurringDraft, RecurringItem, Transaction, TransactionDraft,
};
use crate::store::RecordStore;
use crate::summary::{summarize, Summary};
use crate::view::ViewState;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

/// `expense_data_<YYYY-MM-DD>.csv`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("expense_data_{}.csv", date.format("%Y-%m-%d"))
}

/// What an import did
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    /// Rows accepted by the decoder, before dedup
    pub imported_count: usize,
    /// Records that collapsed into an existing or earlier identity
    pub collapsed: usize,
    pub skipped: Vec<SkippedRow>,
}

/// Filtered rows (newest first) and the totals for them
#[derive(Debug, Clone)]
pub struct Snapshot<'a> {
    pub rows: Vec<&'a Transaction>,
    pub recurring: &'a [RecurringItem],
    pub summary: Summary,
}

pub struct Tracker<S: KeyValueStore> {
    store: S,
    records: RecordStore,
}

impl<S: KeyValueStore> Tracker<S> {
    /// Load both collections from `store`
    pub fn open(store: S) -> Result<Self> {
        let records = load_records(&store).context("Failed to load records")?;
        Ok(Tracker { store, records })
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Apply `change` to a copy, persist it, then swap it in
    fn commit<T>(&mut self, change: impl FnOnce(&mut RecordStore) -> Result<T, StoreError>) -> Result<T> {
        let mut next = self.records.clone();
        let out = change(&mut next)?;
        save_records(&mut self.store, &next).context("Failed to persist records")?;
        self.records = next;
        Ok(out)
    }

    // ========================================================================
    // TRANSACTIONS
    // ========================================================================

    pub fn add_transaction(&mut self, draft: TransactionDraft) -> Result<RecordId> {
        let id = self.commit(|records| Ok(records.add_transaction(draft)))?;
        tracing::info!(%id, "added transaction");
        Ok(id)
    }

    pub fn update_transaction(&mut self, id: RecordId, draft: TransactionDraft) -> Result<()> {
        self.commit(|records| records.update_transaction(id, draft))?;
        tracing::info!(%id, "updated transaction");
        Ok(())
    }

    pub fn remove_transaction(&mut self, id: RecordId) -> Result<Transaction> {
        let removed = self.commit(|records| records.remove_transaction(id))?;
        tracing::info!(%id, "removed transaction");
        Ok(removed)
    }

    // ========================================================================
    // RECURRING ITEMS
    // ========================================================================

    pub fn add_recurring(&mut self, draft: RecurringDraft) -> Result<RecordId> {
        let id = self.commit(|records| Ok(records.add_recurring(draft)))?;
        tracing::info!(%id, "added recurring item");
        Ok(id)
    }

    pub fn update_recurring(&mut self, id: RecordId, draft: RecurringDraft) -> Result<()> {
        self.commit(|records| records.update_recurring(id, draft))?;
        tracing::info!(%id, "updated recurring item");
        Ok(())
    }

    pub fn remove_recurring(&mut self, id: RecordId) -> Result<RecurringItem> {
        let removed = self.commit(|records| records.remove_recurring(id))?;
        tracing::info!(%id, "removed recurring item");
        Ok(removed)
    }

    // ========================================================================
    // VIEW
    // ========================================================================

    pub fn snapshot(&self, view: &ViewState, today: NaiveDate) -> Snapshot<'_> {
        let rows = view.rows(self.records.transactions(), today);
        let summary = summarize(rows.iter().copied(), self.records.recurring());
        Snapshot {
            rows,
            recurring: self.records.recurring(),
            summary,
        }
    }

    // ========================================================================
    // EXPORT / IMPORT
    // ========================================================================

    pub fn export_csv(&self) -> String {
        csv_codec::encode(self.records.recurring(), self.records.transactions())
    }

    /// Write `expense_data_<today>.csv` into `dir`
    pub fn export_to_dir(&self, dir: &Path, today: NaiveDate) -> Result<PathBuf> {
        let path = dir.join(export_file_name(today));
        fs::write(&path, self.export_csv())
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            transactions = self.records.transactions().len(),
            recurring = self.records.recurring().len(),
            "exported CSV"
        );
        Ok(path)
    }

    /// Decode, merge and persist. A format error aborts before anything changes.
    pub fn import_csv(&mut self, text: &str) -> Result<ImportReport> {
        let batch = csv_codec::decode(text)?;

        let (existing_tx, existing_rec) = self.records.clone().into_parts();
        let outcome = merge(existing_tx, existing_rec, batch.transactions, batch.recurring);

        let merged = RecordStore::from_parts(outcome.transactions, outcome.recurring);
        save_records(&mut self.store, &merged).context("Failed to persist imported records")?;
        self.records = merged;

        if !batch.skipped.is_empty() {
            tracing::warn!(skipped = batch.skipped.len(), "import dropped rows");
        }

        Ok(ImportReport {
            imported_count: outcome.imported_count,
            collapsed: outcome.collapsed,
            skipped: batch.skipped,
        })
    }

    pub fn import_file(&mut self, path: &Path) -> Result<ImportReport> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        self.import_csv(&text)
            .with_context(|| format!("Failed to import {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, SqliteStore, RECURRING_KEY, TRANSACTIONS_KEY};
    use crate::error::CsvError;
    use crate::filter::{parse_date, FilterMode};
    use crate::models::EntryType;

    fn salary() -> TransactionDraft {
        TransactionDraft {
            date: "2024-01-05".to_string(),
            entry_type: EntryType::Income,
            category: "Salary".to_string(),
            amount: 1000.0,
        }
    }

    fn rent() -> RecurringDraft {
        RecurringDraft {
            name: "Rent".to_string(),
            entry_type: EntryType::Expense,
            amount: 300.0,
        }
    }

    fn today() -> NaiveDate {
        parse_date("2024-01-10").unwrap()
    }

    #[test]
    fn test_every_mutation_persists() {
        let mut tracker = Tracker::open(MemoryStore::new()).unwrap();
        let id = tracker.add_transaction(salary()).unwrap();
        tracker.add_recurring(rent()).unwrap();

        let reopened = Tracker::open(tracker.into_store()).unwrap();
        assert_eq!(reopened.records().transactions().len(), 1);
        assert_eq!(reopened.records().transactions()[0].id, id);
        assert_eq!(reopened.records().recurring().len(), 1);
    }

    #[test]
    fn test_update_and_remove_by_id() {
        let mut tracker = Tracker::open(SqliteStore::open_in_memory().unwrap()).unwrap();
        let id = tracker.add_transaction(salary()).unwrap();

        let mut draft = salary();
        draft.amount = 1200.0;
        tracker.update_transaction(id, draft).unwrap();
        assert_eq!(tracker.records().transaction(id).unwrap().amount, 1200.0);

        let removed = tracker.remove_transaction(id).unwrap();
        assert_eq!(removed.amount, 1200.0);
        assert!(tracker.records().transactions().is_empty());

        // Second delete reports instead of silently doing nothing
        assert!(tracker.remove_transaction(id).is_err());
    }

    #[test]
    fn test_snapshot_summary() {
        let mut tracker = Tracker::open(MemoryStore::new()).unwrap();
        tracker.add_transaction(salary()).unwrap();
        tracker.add_recurring(rent()).unwrap();

        let snapshot = tracker.snapshot(&ViewState::new(), today());
        assert_eq!(snapshot.rows.len(), 1);
        assert_eq!(snapshot.summary.total_income, 1000.0);
        assert_eq!(snapshot.summary.total_expense, 300.0);
        assert_eq!(snapshot.summary.balance, 700.0);

        let mut view = ViewState::new();
        view.set_filter_mode(FilterMode::Daily, today());
        let snapshot = tracker.snapshot(&view, today());
        assert!(snapshot.rows.is_empty());
        assert_eq!(snapshot.summary.total_expense, 300.0);
    }

    #[test]
    fn test_import_merges_and_reports_raw_count() {
        let mut tracker = Tracker::open(MemoryStore::new()).unwrap();
        let existing = tracker.add_transaction(salary()).unwrap();

        let text = "RecordType,Date,Name,Category,Type,Amount\n\
                    Transaction,2024-01-05,,\"Salary\",expense,1000\n\
                    Transaction,2024-01-06,,\"Food\",expense,20\n\
                    Transaction,2024-01-06,,\"Food\",expense,20\n\
                    Transaction,,,\"Broken\",expense,1\n";

        let report = tracker.import_csv(text).unwrap();

        assert_eq!(report.imported_count, 3);
        assert_eq!(report.collapsed, 2);
        assert_eq!(report.skipped.len(), 1);

        let txs = tracker.records().transactions();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].id, existing);
        assert_eq!(txs[0].entry_type, EntryType::Expense);

        let reopened = Tracker::open(tracker.into_store()).unwrap();
        assert_eq!(reopened.records().transactions().len(), 2);
    }

    #[test]
    fn test_bad_header_changes_nothing() {
        let mut tracker = Tracker::open(MemoryStore::new()).unwrap();
        tracker.add_transaction(salary()).unwrap();
        let before = tracker.records().clone();

        let err = tracker.import_csv("Foo,Bar\n").unwrap_err();
        assert_eq!(
            err.downcast_ref::<CsvError>(),
            Some(&CsvError::InvalidHeader {
                found: "Foo".to_string()
            })
        );
        assert_eq!(tracker.records(), &before);

        let err = tracker.import_csv("\u{feff}").unwrap_err();
        assert_eq!(err.downcast_ref::<CsvError>(), Some(&CsvError::Empty));
    }

    #[test]
    fn test_import_persists_both_keys() {
        let mut tracker = Tracker::open(MemoryStore::new()).unwrap();
        tracker
            .import_csv("RecordType,Date,Name,Category,Type,Amount\nRecurring,,\"Gym\",,expense,30\n")
            .unwrap();

        let store = tracker.into_store();
        assert_eq!(store.load(TRANSACTIONS_KEY).unwrap().as_deref(), Some("[]"));
        assert!(store.load(RECURRING_KEY).unwrap().unwrap().contains("\"Gym\""));
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name(today()), "expense_data_2024-01-10.csv");
    }

    #[test]
    fn test_export_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = Tracker::open(MemoryStore::new()).unwrap();
        tracker.add_recurring(rent()).unwrap();

        let path = tracker.export_to_dir(dir.path(), today()).unwrap();
        let written = fs::read_to_string(&path).unwrap();

        assert!(path.ends_with("expense_data_2024-01-10.csv"));
        assert!(written.starts_with('\u{feff}'));
        assert!(written.contains("Recurring,,\"Rent\",,expense,300"));
    }
}
