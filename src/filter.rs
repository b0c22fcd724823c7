// 📅 Filter Engine - Period views over transactions
// Recurring items are never filtered; only dated transactions pass through here.

use crate::error::UnknownFilterMode;
use crate::models::Transaction;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    All,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl FilterMode {
    pub const ALL_MODES: [FilterMode; 5] = [
        FilterMode::All,
        FilterMode::Daily,
        FilterMode::Weekly,
        FilterMode::Monthly,
        FilterMode::Yearly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterMode::All => "all",
            FilterMode::Daily => "daily",
            FilterMode::Weekly => "weekly",
            FilterMode::Monthly => "monthly",
            FilterMode::Yearly => "yearly",
        }
    }

    /// Cycle order used by the dashboard
    pub fn next(&self) -> Self {
        match self {
            FilterMode::All => FilterMode::Daily,
            FilterMode::Daily => FilterMode::Weekly,
            FilterMode::Weekly => FilterMode::Monthly,
            FilterMode::Monthly => FilterMode::Yearly,
            FilterMode::Yearly => FilterMode::All,
        }
    }

    /// Daily/weekly/monthly read the reference date
    pub fn uses_date(&self) -> bool {
        matches!(self, FilterMode::Daily | FilterMode::Weekly | FilterMode::Monthly)
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterMode {
    type Err = UnknownFilterMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        FilterMode::ALL_MODES
            .into_iter()
            .find(|mode| mode.as_str() == wanted)
            .ok_or_else(|| UnknownFilterMode(s.to_string()))
    }
}

// ============================================================================
// DATE HELPERS
// ============================================================================

/// Parse a `YYYY-MM-DD` date as a plain calendar date (no timezone)
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Integer coercion for the year input: leading sign and digits only.
///
/// `"2024"` and `"2024abc"` give 2024; `""`, `"abc"` and `"-"` give `None`.
pub fn parse_year(s: &str) -> Option<i32> {
    let s = s.trim();
    let (sign, rest) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse::<i32>().ok().map(|year| sign * year)
}

/// Sunday..=Saturday window containing `date`.
///
/// Near the end of the calendar range the window end is clamped to
/// `NaiveDate::MAX`; a week whose Sunday falls before `NaiveDate::MIN` is `None`.
pub fn week_bounds(date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let back = Duration::days(date.weekday().num_days_from_sunday() as i64);
    let start = date.checked_sub_signed(back)?;
    let end = start
        .checked_add_signed(Duration::days(6))
        .unwrap_or(NaiveDate::MAX);
    Some((start, end))
}

// ============================================================================
// FILTER
// ============================================================================

/// Derive the period view of `transactions`.
///
/// * `all` returns everything in backing order.
/// * `daily` compares the date *string* with `reference_date`; no reference, no rows.
/// * `weekly` / `monthly` fall back to `today` when there is no reference date.
/// * `yearly` without a year returns everything. This differs from `daily`
///   and is kept as-is until the intended behavior is settled.
pub fn filter_transactions<'a>(
    transactions: &'a [Transaction],
    mode: FilterMode,
    reference_date: Option<&str>,
    reference_year: Option<i32>,
    today: NaiveDate,
) -> Vec<&'a Transaction> {
    let reference_date = reference_date.filter(|s| !s.trim().is_empty());

    let filtered: Vec<&Transaction> = match mode {
        FilterMode::All => transactions.iter().collect(),
        FilterMode::Daily => match reference_date {
            Some(day) => transactions.iter().filter(|tx| tx.date == day).collect(),
            None => Vec::new(),
        },
        FilterMode::Weekly => match anchor_date(reference_date, today).and_then(week_bounds) {
            Some((start, end)) => {
                transactions
                    .iter()
                    .filter(|tx| parse_date(&tx.date).is_some_and(|d| d >= start && d <= end))
                    .collect()
            }
            None => Vec::new(),
        },
        FilterMode::Monthly => match anchor_date(reference_date, today) {
            Some(anchor) => transactions
                .iter()
                .filter(|tx| {
                    parse_date(&tx.date)
                        .is_some_and(|d| d.year() == anchor.year() && d.month() == anchor.month())
                })
                .collect(),
            None => Vec::new(),
        },
        FilterMode::Yearly => match reference_year {
            Some(year) => transactions
                .iter()
                .filter(|tx| parse_date(&tx.date).is_some_and(|d| d.year() == year))
                .collect(),
            None => transactions.iter().collect(),
        },
    };

    tracing::debug!(
        mode = mode.as_str(),
        reference_date,
        reference_year,
        kept = filtered.len(),
        total = transactions.len(),
        "filtered transactions"
    );

    filtered
}

/// Reference date for weekly/monthly. A present but unparseable reference
/// matches nothing.
fn anchor_date(reference_date: Option<&str>, today: NaiveDate) -> Option<NaiveDate> {
    match reference_date {
        Some(s) => parse_date(s),
        None => Some(today),
    }
}

/// Display order: newest first. Stable, so same-day rows keep backing order;
/// rows with unparseable dates go last.
pub fn sort_newest_first(rows: &mut [&Transaction]) {
    rows.sort_by(|a, b| parse_date(&b.date).cmp(&parse_date(&a.date)));
}
