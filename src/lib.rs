// Expense Tracker - Core Library
// Exposes all modules for use in the CLI, the TUI, and tests

pub mod config;
pub mod csv_codec;
pub mod db;
pub mod deduplication;
pub mod error;
pub mod filter;
pub mod logging;
pub mod models;
pub mod store;
pub mod summary;
pub mod tracker;
pub mod view;

// Re-export commonly used types
pub use config::Config;
pub use csv_codec::{decode, encode, DecodedBatch, SkipReason, SkippedRow};
pub use db::{
    load_records, save_records, setup_database, KeyValueStore, MemoryStore, SqliteStore,
    RECURRING_KEY, TRANSACTIONS_KEY,
};
pub use deduplication::{merge, Deduplicate, MergeOutcome};
pub use error::{CsvError, StorageError, StoreError, UnknownFilterMode};
pub use filter::{filter_transactions, sort_newest_first, FilterMode};
pub use models::{
    EntryType, RecordId, RecordKind, RecurringDraft, RecurringItem, Transaction,
    TransactionDraft,
};
pub use store::RecordStore;
pub use summary::{format_amount, summarize, Summary};
pub use tracker::{export_file_name, ImportReport, Snapshot, Tracker};
pub use view::ViewState;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
