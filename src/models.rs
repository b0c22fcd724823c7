// 📒 Record Model - Transactions and recurring items
// Identity (id) is stable; deduplication uses value tuples instead (see deduplication.rs)

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// RECORD ID
// ============================================================================

/// Stable surrogate identifier, assigned once when a record is created.
///
/// Edit/delete addressing goes through this id, never through the record's
/// position or its field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn new() -> Self {
        RecordId(Uuid::new_v4())
    }

    /// First 8 hex digits, enough to address a record from the CLI
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }

    /// Prefix match against the hyphenated or simple form
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        let prefix = prefix.trim().to_lowercase();
        if prefix.is_empty() {
            return false;
        }
        self.0.hyphenated().to_string().starts_with(&prefix)
            || self.0.simple().to_string().starts_with(&prefix)
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

// ============================================================================
// ENTRY TYPE
// ============================================================================

/// Income or expense.
///
/// Anything else read from storage or CSV is kept verbatim as `Unrecognized`
/// instead of being rejected; such entries count toward neither total.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryType {
    Income,
    Expense,
    Unrecognized(String),
}

impl EntryType {
    pub fn as_str(&self) -> &str {
        match self {
            EntryType::Income => "income",
            EntryType::Expense => "expense",
            EntryType::Unrecognized(raw) => raw,
        }
    }

    /// Human-readable label for display
    pub fn label(&self) -> &str {
        match self {
            EntryType::Income => "Income",
            EntryType::Expense => "Expense",
            EntryType::Unrecognized(raw) => raw,
        }
    }

    pub fn is_income(&self) -> bool {
        matches!(self, EntryType::Income)
    }

    pub fn is_expense(&self) -> bool {
        matches!(self, EntryType::Expense)
    }
}

impl From<&str> for EntryType {
    fn from(raw: &str) -> Self {
        match raw {
            "income" => EntryType::Income,
            "expense" => EntryType::Expense,
            other => EntryType::Unrecognized(other.to_string()),
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EntryType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EntryType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(EntryType::from(raw.as_str()))
    }
}

// ============================================================================
// RECORDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Transaction,
    Recurring,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Transaction => f.write_str("transaction"),
            RecordKind::Recurring => f.write_str("recurring item"),
        }
    }
}

/// Anything the record store can address by id
pub trait Record {
    const KIND: RecordKind;

    fn id(&self) -> RecordId;
}

/// A single dated income or expense entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Records persisted before ids existed get a fresh one on load
    #[serde(default)]
    pub id: RecordId,

    /// ISO 8601 calendar date, kept as the string the user entered
    pub date: String,

    #[serde(rename = "type")]
    pub entry_type: EntryType,

    pub category: String,

    pub amount: f64,
}

impl Transaction {
    pub fn new(date: impl Into<String>, entry_type: EntryType, category: impl Into<String>, amount: f64) -> Self {
        Transaction {
            id: RecordId::new(),
            date: date.into(),
            entry_type,
            category: category.into(),
            amount,
        }
    }
}

impl Record for Transaction {
    const KIND: RecordKind = RecordKind::Transaction;

    fn id(&self) -> RecordId {
        self.id
    }
}

/// A named income or expense applied to every period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringItem {
    #[serde(default)]
    pub id: RecordId,

    pub name: String,

    #[serde(rename = "type")]
    pub entry_type: EntryType,

    pub amount: f64,
}

impl RecurringItem {
    pub fn new(name: impl Into<String>, entry_type: EntryType, amount: f64) -> Self {
        RecurringItem {
            id: RecordId::new(),
            name: name.into(),
            entry_type,
            amount,
        }
    }
}

impl Record for RecurringItem {
    const KIND: RecordKind = RecordKind::Recurring;

    fn id(&self) -> RecordId {
        self.id
    }
}

// ============================================================================
// DRAFTS (field values without identity)
// ============================================================================

/// Field values for creating or replacing a transaction
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    pub date: String,
    pub entry_type: EntryType,
    pub category: String,
    pub amount: f64,
}

impl TransactionDraft {
    pub fn into_transaction(self, id: RecordId) -> Transaction {
        Transaction {
            id,
            date: self.date,
            entry_type: self.entry_type,
            category: self.category,
            amount: self.amount,
        }
    }
}

impl From<&Transaction> for TransactionDraft {
    fn from(tx: &Transaction) -> Self {
        TransactionDraft {
            date: tx.date.clone(),
            entry_type: tx.entry_type.clone(),
            category: tx.category.clone(),
            amount: tx.amount,
        }
    }
}

/// Field values for creating or replacing a recurring item
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringDraft {
    pub name: String,
    pub entry_type: EntryType,
    pub amount: f64,
}

impl RecurringDraft {
    pub fn into_item(self, id: RecordId) -> RecurringItem {
        RecurringItem {
            id,
            name: self.name,
            entry_type: self.entry_type,
            amount: self.amount,
        }
    }
}

impl From<&RecurringItem> for RecurringDraft {
    fn from(item: &RecurringItem) -> Self {
        RecurringDraft {
            name: item.name.clone(),
            entry_type: item.entry_type.clone(),
            amount: item.amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_type_from_str() {
        assert_eq!(EntryType::from("income"), EntryType::Income);
        assert_eq!(EntryType::from("expense"), EntryType::Expense);
        assert_eq!(
            EntryType::from("Income"),
            EntryType::Unrecognized("Income".to_string())
        );
    }

    #[test]
    fn test_transaction_json_shape() {
        let tx = Transaction::new("2024-01-05", EntryType::Income, "Salary", 1000.0);
        let json = serde_json::to_value(&tx).unwrap();

        assert_eq!(json["date"], "2024-01-05");
        assert_eq!(json["type"], "income");
        assert_eq!(json["category"], "Salary");
        assert_eq!(json["amount"], 1000.0);
        assert_eq!(json["id"], tx.id.to_string());
    }

    #[test]
    fn test_missing_id_gets_fresh_one() {
        let json = r#"[{"date":"2024-01-05","type":"expense","category":"Food","amount":12.5},
                       {"date":"2024-01-05","type":"expense","category":"Food","amount":12.5}]"#;
        let txs: Vec<Transaction> = serde_json::from_str(json).unwrap();

        assert_eq!(txs.len(), 2);
        assert_ne!(txs[0].id, txs[1].id);
        assert_eq!(txs[0].entry_type, EntryType::Expense);
    }

    #[test]
    fn test_unrecognized_type_round_trips() {
        let json = r#"{"name":"Gift","type":"transfer","amount":5}"#;
        let item: RecurringItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.entry_type, EntryType::Unrecognized("transfer".to_string()));

        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back["type"], "transfer");
    }

    #[test]
    fn test_record_id_prefix() {
        let id = RecordId::new();
        let short = id.short();

        assert_eq!(short.len(), 8);
        assert!(id.matches_prefix(&short));
        assert!(id.matches_prefix(&id.to_string()));
        assert!(!id.matches_prefix(""));
    }
}
