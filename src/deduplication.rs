// 🔍 Import Merger - Deduplicate existing + imported records
//
// Identity tuples:
//   Transaction   -> (date, category, amount)
//   RecurringItem -> (name, amount)
//
// Last occurrence wins on field values; position and id come from the first.

use crate::models::{RecurringItem, Transaction};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;

// ============================================================================
// IDENTITY
// ============================================================================

/// Amount as a hashable key. `-0.0` and `0.0` are the same amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AmountKey(u64);

impl AmountKey {
    pub fn of(amount: f64) -> Self {
        let normalized = if amount == 0.0 { 0.0 } else { amount };
        AmountKey(normalized.to_bits())
    }
}

/// Records that collapse onto an identity tuple during import
pub trait Deduplicate {
    type Key: Eq + Hash;

    fn dedup_key(&self) -> Self::Key;

    /// Take `newer`'s field values, keep our own id
    fn absorb(&mut self, newer: Self);
}

impl Deduplicate for Transaction {
    type Key = (String, String, AmountKey);

    fn dedup_key(&self) -> Self::Key {
        (self.date.clone(), self.category.clone(), AmountKey::of(self.amount))
    }

    fn absorb(&mut self, newer: Self) {
        let id = self.id;
        *self = newer;
        self.id = id;
    }
}

impl Deduplicate for RecurringItem {
    type Key = (String, AmountKey);

    fn dedup_key(&self) -> Self::Key {
        (self.name.clone(), AmountKey::of(self.amount))
    }

    fn absorb(&mut self, newer: Self) {
        let id = self.id;
        *self = newer;
        self.id = id;
    }
}

/// Collapse duplicates, keeping the last occurrence's values at the first
/// occurrence's position.
pub fn dedup_keep_last<T, I>(items: I) -> Vec<T>
where
    T: Deduplicate,
    I: IntoIterator<Item = T>,
{
    let mut slots: HashMap<T::Key, usize> = HashMap::new();
    let mut survivors: Vec<T> = Vec::new();

    for item in items {
        match slots.entry(item.dedup_key()) {
            Entry::Occupied(slot) => survivors[*slot.get()].absorb(item),
            Entry::Vacant(slot) => {
                slot.insert(survivors.len());
                survivors.push(item);
            }
        }
    }

    survivors
}

// ============================================================================
// MERGE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub transactions: Vec<Transaction>,
    pub recurring: Vec<RecurringItem>,

    /// Raw accepted import rows, before dedup. Reporting only.
    pub imported_count: usize,

    /// How many records disappeared into an earlier identity tuple
    pub collapsed: usize,
}

/// Existing records first, imported appended, then dedup each collection.
pub fn merge(
    existing_transactions: Vec<Transaction>,
    existing_recurring: Vec<RecurringItem>,
    imported_transactions: Vec<Transaction>,
    imported_recurring: Vec<RecurringItem>,
) -> MergeOutcome {
    let imported_count = imported_transactions.len() + imported_recurring.len();
    let total_in = existing_transactions.len()
        + existing_recurring.len()
        + imported_count;

    let transactions = dedup_keep_last(existing_transactions.into_iter().chain(imported_transactions));
    let recurring = dedup_keep_last(existing_recurring.into_iter().chain(imported_recurring));

    let collapsed = total_in - transactions.len() - recurring.len();

    tracing::info!(
        imported_count,
        collapsed,
        transactions = transactions.len(),
        recurring = recurring.len(),
        "merged import"
    );

    MergeOutcome {
        transactions,
        recurring,
        imported_count,
        collapsed,
    }
}

// ============================================================================
// TESTS
// ============================================================================
