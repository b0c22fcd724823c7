// 🗂️ Record Store - Ordered in-memory collections
// Insertion order is the backing order; display sorting never reorders it.

use crate::error::StoreError;
use crate::models::{
    Record, RecordId, RecurringDraft, RecurringItem, Transaction, TransactionDraft,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStore {
    transactions: Vec<Transaction>,
    recurring: Vec<RecurringItem>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(transactions: Vec<Transaction>, recurring: Vec<RecurringItem>) -> Self {
        RecordStore {
            transactions,
            recurring,
        }
    }

    pub fn into_parts(self) -> (Vec<Transaction>, Vec<RecurringItem>) {
        (self.transactions, self.recurring)
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn recurring(&self) -> &[RecurringItem] {
        &self.recurring
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty() && self.recurring.is_empty()
    }

    // ========================================================================
    // TRANSACTIONS
    // ========================================================================

    pub fn add_transaction(&mut self, draft: TransactionDraft) -> RecordId {
        let id = RecordId::new();
        self.transactions.push(draft.into_transaction(id));
        id
    }

    pub fn transaction(&self, id: RecordId) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| tx.id == id)
    }

    pub fn update_transaction(
        &mut self,
        id: RecordId,
        draft: TransactionDraft,
    ) -> Result<(), StoreError> {
        let index = position_of(&self.transactions, id)?;
        self.transactions[index] = draft.into_transaction(id);
        Ok(())
    }

    pub fn remove_transaction(&mut self, id: RecordId) -> Result<Transaction, StoreError> {
        let index = position_of(&self.transactions, id)?;
        Ok(self.transactions.remove(index))
    }

    /// Positional update; keeps the record's id
    pub fn update_transaction_at(
        &mut self,
        index: usize,
        draft: TransactionDraft,
    ) -> Result<(), StoreError> {
        check_index(&self.transactions, index)?;
        let id = self.transactions[index].id;
        self.transactions[index] = draft.into_transaction(id);
        Ok(())
    }

    pub fn remove_transaction_at(&mut self, index: usize) -> Result<Transaction, StoreError> {
        check_index(&self.transactions, index)?;
        Ok(self.transactions.remove(index))
    }

    pub fn resolve_transaction_id(&self, prefix: &str) -> Result<RecordId, StoreError> {
        resolve_prefix(&self.transactions, prefix)
    }

    // ========================================================================
    // RECURRING ITEMS
    // ========================================================================

    pub fn add_recurring(&mut self, draft: RecurringDraft) -> RecordId {
        let id = RecordId::new();
        self.recurring.push(draft.into_item(id));
        id
    }

    pub fn recurring_item(&self, id: RecordId) -> Option<&RecurringItem> {
        self.recurring.iter().find(|item| item.id == id)
    }

    pub fn update_recurring(
        &mut self,
        id: RecordId,
        draft: RecurringDraft,
    ) -> Result<(), StoreError> {
        let index = position_of(&self.recurring, id)?;
        self.recurring[index] = draft.into_item(id);
        Ok(())
    }

    pub fn remove_recurring(&mut self, id: RecordId) -> Result<RecurringItem, StoreError> {
        let index = position_of(&self.recurring, id)?;
        Ok(self.recurring.remove(index))
    }

    pub fn update_recurring_at(
        &mut self,
        index: usize,
        draft: RecurringDraft,
    ) -> Result<(), StoreError> {
        check_index(&self.recurring, index)?;
        let id = self.recurring[index].id;
        self.recurring[index] = draft.into_item(id);
        Ok(())
    }

    pub fn remove_recurring_at(&mut self, index: usize) -> Result<RecurringItem, StoreError> {
        check_index(&self.recurring, index)?;
        Ok(self.recurring.remove(index))
    }

    pub fn resolve_recurring_id(&self, prefix: &str) -> Result<RecordId, StoreError> {
        resolve_prefix(&self.recurring, prefix)
    }
}

fn check_index<T: Record>(items: &[T], index: usize) -> Result<(), StoreError> {
    if index < items.len() {
        Ok(())
    } else {
        Err(StoreError::IndexOutOfBounds {
            kind: T::KIND,
            index,
            len: items.len(),
        })
    }
}

fn position_of<T: Record>(items: &[T], id: RecordId) -> Result<usize, StoreError> {
    items
        .iter()
        .position(|item| item.id() == id)
        .ok_or_else(|| StoreError::NotFound {
            kind: T::KIND,
            id: id.to_string(),
        })
}

fn resolve_prefix<T: Record>(items: &[T], prefix: &str) -> Result<RecordId, StoreError> {
    let matches: Vec<RecordId> = items
        .iter()
        .map(|item| item.id())
        .filter(|id| id.matches_prefix(prefix))
        .collect();

    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(StoreError::NotFound {
            kind: T::KIND,
            id: prefix.to_string(),
        }),
        _ => Err(StoreError::AmbiguousId {
            kind: T::KIND,
            prefix: prefix.to_string(),
            matches: matches.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntryType, RecordKind};

    fn draft(date: &str, category: &str, amount: f64) -> TransactionDraft {
        TransactionDraft {
            date: date.to_string(),
            entry_type: EntryType::Expense,
            category: category.to_string(),
            amount,
        }
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let mut store = RecordStore::new();
        store.add_transaction(draft("2024-03-01", "Rent", 900.0));
        store.add_transaction(draft("2024-01-01", "Food", 20.0));

        let categories: Vec<&str> = store
            .transactions()
            .iter()
            .map(|tx| tx.category.as_str())
            .collect();
        assert_eq!(categories, vec!["Rent", "Food"]);
    }

    #[test]
    fn test_duplicate_tuples_allowed_on_manual_add() {
        let mut store = RecordStore::new();
        let a = store.add_transaction(draft("2024-01-01", "Food", 20.0));
        let b = store.add_transaction(draft("2024-01-01", "Food", 20.0));

        assert_eq!(store.transactions().len(), 2);
        assert_ne!(a, b);

        // Deleting one duplicate leaves the other addressable
        store.remove_transaction(a).unwrap();
        assert!(store.transaction(b).is_some());
        assert_eq!(store.transactions().len(), 1);
    }

    #[test]
    fn test_update_keeps_id() {
        let mut store = RecordStore::new();
        let id = store.add_transaction(draft("2024-01-01", "Food", 20.0));

        store
            .update_transaction(id, draft("2024-01-02", "Groceries", 25.0))
            .unwrap();

        let tx = store.transaction(id).unwrap();
        assert_eq!(tx.category, "Groceries");
        assert_eq!(tx.amount, 25.0);
    }

    #[test]
    fn test_index_out_of_bounds() {
        let mut store = RecordStore::new();
        store.add_transaction(draft("2024-01-01", "Food", 20.0));

        let err = store.remove_transaction_at(3).unwrap_err();
        assert_eq!(
            err,
            StoreError::IndexOutOfBounds {
                kind: RecordKind::Transaction,
                index: 3,
                len: 1
            }
        );
        assert_eq!(store.transactions().len(), 1);

        let err = store
            .update_recurring_at(0, RecurringDraft {
                name: "Rent".to_string(),
                entry_type: EntryType::Expense,
                amount: 300.0,
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::IndexOutOfBounds { kind: RecordKind::Recurring, .. }));
    }

    #[test]
    fn test_positional_update_keeps_id() {
        let mut store = RecordStore::new();
        let id = store.add_recurring(RecurringDraft {
            name: "Gym".to_string(),
            entry_type: EntryType::Expense,
            amount: 30.0,
        });

        store
            .update_recurring_at(0, RecurringDraft {
                name: "Gym".to_string(),
                entry_type: EntryType::Expense,
                amount: 35.0,
            })
            .unwrap();

        assert_eq!(store.recurring_item(id).unwrap().amount, 35.0);
    }

    #[test]
    fn test_unknown_id_is_an_error() {
        let mut store = RecordStore::new();
        let err = store.remove_recurring(RecordId::new()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { kind: RecordKind::Recurring, .. }));
    }

    #[test]
    fn test_resolve_prefix() {
        let mut store = RecordStore::new();
        let id = store.add_transaction(draft("2024-01-01", "Food", 20.0));

        assert_eq!(store.resolve_transaction_id(&id.short()).unwrap(), id);
        assert!(matches!(
            store.resolve_transaction_id("zzzz"),
            Err(StoreError::NotFound { .. })
        ));
    }
}
