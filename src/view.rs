// 👁️ View State - What the presentation layer is looking at
// Filter selection and edit-in-progress markers, passed explicitly into the
// filter engine instead of living in ambient globals.

use crate::filter::{filter_transactions, parse_date, parse_year, sort_newest_first, FilterMode};
use crate::models::{RecordId, Transaction};
use chrono::{Datelike, Duration, Months, NaiveDate};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub filter_mode: FilterMode,

    /// Raw date input (`YYYY-MM-DD`), used by daily/weekly/monthly
    pub filter_date: Option<String>,

    /// Raw year input, used by yearly
    pub filter_year: Option<String>,

    editing_transaction: Option<RecordId>,
    editing_recurring: Option<RecordId>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch mode. A date-based mode with no date picks today; yearly with
    /// no year picks the current year. Existing inputs are kept.
    pub fn set_filter_mode(&mut self, mode: FilterMode, today: NaiveDate) {
        self.filter_mode = mode;

        if mode.uses_date() && self.filter_date.as_deref().map_or(true, |d| d.trim().is_empty()) {
            self.filter_date = Some(today.format("%Y-%m-%d").to_string());
        }
        if mode == FilterMode::Yearly
            && self.filter_year.as_deref().map_or(true, |y| y.trim().is_empty())
        {
            self.filter_year = Some(today.year().to_string());
        }
    }

    pub fn set_filter_date(&mut self, date: Option<String>) {
        self.filter_date = date;
    }

    pub fn set_filter_year(&mut self, year: Option<String>) {
        self.filter_year = year;
    }

    pub fn reference_year(&self) -> Option<i32> {
        self.filter_year.as_deref().and_then(parse_year)
    }

    /// Filtered view in backing order
    pub fn apply<'a>(&self, transactions: &'a [Transaction], today: NaiveDate) -> Vec<&'a Transaction> {
        filter_transactions(
            transactions,
            self.filter_mode,
            self.filter_date.as_deref(),
            self.reference_year(),
            today,
        )
    }

    /// Filtered view, newest first
    pub fn rows<'a>(&self, transactions: &'a [Transaction], today: NaiveDate) -> Vec<&'a Transaction> {
        let mut rows = self.apply(transactions, today);
        sort_newest_first(&mut rows);
        rows
    }

    /// Move the reference one period forward or back
    pub fn step(&mut self, forward: bool, today: NaiveDate) {
        let sign: i64 = if forward { 1 } else { -1 };

        match self.filter_mode {
            FilterMode::All => {}
            FilterMode::Yearly => {
                let year = self.reference_year().unwrap_or_else(|| today.year());
                if let Some(moved) = year.checked_add(sign as i32) {
                    self.filter_year = Some(moved.to_string());
                }
            }
            mode => {
                let anchor = self
                    .filter_date
                    .as_deref()
                    .and_then(parse_date)
                    .unwrap_or(today);
                let moved = match mode {
                    FilterMode::Daily => anchor.checked_add_signed(Duration::days(sign)),
                    FilterMode::Weekly => anchor.checked_add_signed(Duration::days(7 * sign)),
                    _ if forward => anchor.checked_add_months(Months::new(1)),
                    _ => anchor.checked_sub_months(Months::new(1)),
                };
                if let Some(moved) = moved {
                    self.filter_date = Some(moved.format("%Y-%m-%d").to_string());
                }
            }
        }
    }

    /// Short label like `weekly 2024-01-07` for headers and CLI output
    pub fn describe(&self) -> String {
        match self.filter_mode {
            FilterMode::All => "all".to_string(),
            FilterMode::Yearly => match self.reference_year() {
                Some(year) => format!("yearly {}", year),
                None => "yearly (any year)".to_string(),
            },
            mode => match self.filter_date.as_deref().filter(|d| !d.trim().is_empty()) {
                Some(date) => format!("{} {}", mode, date),
                None => format!("{} (today)", mode),
            },
        }
    }

    // ========================================================================
    // EDIT IN PROGRESS
    // At most one transaction and one recurring item, independently.
    // ========================================================================

    pub fn begin_edit_transaction(&mut self, id: RecordId) {
        self.editing_transaction = Some(id);
    }

    pub fn cancel_edit_transaction(&mut self) {
        self.editing_transaction = None;
    }

    pub fn editing_transaction(&self) -> Option<RecordId> {
        self.editing_transaction
    }

    pub fn begin_edit_recurring(&mut self, id: RecordId) {
        self.editing_recurring = Some(id);
    }

    pub fn cancel_edit_recurring(&mut self) {
        self.editing_recurring = None;
    }

    pub fn editing_recurring(&self) -> Option<RecordId> {
        self.editing_recurring
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryType;

    fn today() -> NaiveDate {
        parse_date("2024-03-15").unwrap()
    }

    #[test]
    fn test_set_mode_fills_defaults() {
        let mut view = ViewState::new();

        view.set_filter_mode(FilterMode::Weekly, today());
        assert_eq!(view.filter_date.as_deref(), Some("2024-03-15"));

        view.set_filter_mode(FilterMode::Yearly, today());
        assert_eq!(view.reference_year(), Some(2024));
    }

    #[test]
    fn test_set_mode_keeps_existing_date() {
        let mut view = ViewState::new();
        view.set_filter_date(Some("2023-07-01".to_string()));

        view.set_filter_mode(FilterMode::Daily, today());
        assert_eq!(view.filter_date.as_deref(), Some("2023-07-01"));
    }

    #[test]
    fn test_rows_sorted_newest_first() {
        let txs = vec![
            Transaction::new("2024-03-01", EntryType::Expense, "A", 1.0),
            Transaction::new("2024-03-10", EntryType::Expense, "B", 2.0),
            Transaction::new("2024-02-10", EntryType::Expense, "C", 3.0),
        ];
        let mut view = ViewState::new();
        view.set_filter_mode(FilterMode::Monthly, today());

        let rows = view.rows(&txs, today());
        let categories: Vec<&str> = rows.iter().map(|tx| tx.category.as_str()).collect();
        assert_eq!(categories, vec!["B", "A"]);

        // Backing order untouched
        assert_eq!(txs[0].category, "A");
    }

    #[test]
    fn test_step_periods() {
        let mut view = ViewState::new();
        view.set_filter_mode(FilterMode::Monthly, today());
        view.step(true, today());
        assert_eq!(view.filter_date.as_deref(), Some("2024-04-15"));

        view.set_filter_mode(FilterMode::Weekly, today());
        view.step(false, today());
        assert_eq!(view.filter_date.as_deref(), Some("2024-04-08"));

        view.set_filter_mode(FilterMode::Yearly, today());
        view.step(false, today());
        assert_eq!(view.reference_year(), Some(2023));
    }

    #[test]
    fn test_step_year_at_i32_limit_keeps_year() {
        let mut view = ViewState::new();
        view.set_filter_year(Some(i32::MAX.to_string()));
        view.set_filter_mode(FilterMode::Yearly, today());

        view.step(true, today());
        assert_eq!(view.reference_year(), Some(i32::MAX));

        view.step(false, today());
        assert_eq!(view.reference_year(), Some(i32::MAX - 1));
    }

    #[test]
    fn test_step_day_at_calendar_end_keeps_date() {
        let mut view = ViewState::new();
        let last = NaiveDate::MAX.format("%Y-%m-%d").to_string();
        view.set_filter_date(Some(last.clone()));
        view.set_filter_mode(FilterMode::Daily, today());

        view.step(true, today());
        assert_eq!(view.filter_date.as_deref(), Some(last.as_str()));
    }

    #[test]
    fn test_edit_markers_are_independent() {
        let mut view = ViewState::new();
        let tx_id = RecordId::new();
        let rec_id = RecordId::new();

        view.begin_edit_transaction(tx_id);
        view.begin_edit_recurring(rec_id);
        assert_eq!(view.editing_transaction(), Some(tx_id));
        assert_eq!(view.editing_recurring(), Some(rec_id));

        view.cancel_edit_transaction();
        assert_eq!(view.editing_transaction(), None);
        assert_eq!(view.editing_recurring(), Some(rec_id));
    }

    #[test]
    fn test_describe() {
        let mut view = ViewState::new();
        assert_eq!(view.describe(), "all");

        view.set_filter_mode(FilterMode::Daily, today());
        assert_eq!(view.describe(), "daily 2024-03-15");
    }
}
