// 💰 Aggregator - Income / expense / balance totals

use crate::models::{RecurringItem, Transaction};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total_income: f64,
    pub total_expense: f64,
    pub balance: f64,
}

impl Summary {
    pub fn is_deficit(&self) -> bool {
        self.balance < 0.0
    }
}

/// Totals over a (filtered) transaction view plus *every* recurring item.
///
/// Plain f64 sums, no intermediate rounding. Entries whose type is neither
/// income nor expense count toward neither total.
pub fn summarize<'a, I>(transactions: I, recurring: &[RecurringItem]) -> Summary
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut income = 0.0;
    let mut expense = 0.0;
    for tx in transactions {
        if tx.entry_type.is_income() {
            income += tx.amount;
        } else if tx.entry_type.is_expense() {
            expense += tx.amount;
        }
    }

    let recurring_income: f64 = recurring
        .iter()
        .filter(|item| item.entry_type.is_income())
        .map(|item| item.amount)
        .sum();
    let recurring_expense: f64 = recurring
        .iter()
        .filter(|item| item.entry_type.is_expense())
        .map(|item| item.amount)
        .sum();

    let total_income = income + recurring_income;
    let total_expense = expense + recurring_expense;

    Summary {
        total_income,
        total_expense,
        balance: total_income - total_expense,
    }
}

/// Two fraction digits, the only display format the tracker uses
pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}
