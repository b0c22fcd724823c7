// 🧾 CSV Codec - Export / import format
//
// RecordType,Date,Name,Category,Type,Amount
// Recurring,,"Rent",,expense,300
// Transaction,2024-01-05,,"Salary",income,1000
//
// Fixed six columns for both record types. Output starts with a BOM so
// spreadsheet tools pick UTF-8.

use crate::error::CsvError;
use crate::models::{EntryType, RecurringItem, Transaction};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use std::fmt;

pub const HEADERS: [&str; 6] = ["RecordType", "Date", "Name", "Category", "Type", "Amount"];
pub const BOM: char = '\u{feff}';

const RECURRING_TAG: &str = "Recurring";
const TRANSACTION_TAG: &str = "Transaction";

// Column positions
const COL_DATE: usize = 1;
const COL_NAME: usize = 2;
const COL_CATEGORY: usize = 3;
const COL_TYPE: usize = 4;
const COL_AMOUNT: usize = 5;

// ============================================================================
// ENCODE
// ============================================================================

/// Serialize recurring items first, then transactions.
pub fn encode(recurring: &[RecurringItem], transactions: &[Transaction]) -> String {
    let mut out = String::new();
    out.push(BOM);
    out.push_str(&HEADERS.join(","));
    out.push('\n');

    for item in recurring {
        out.push_str(&format!(
            "{},,{},,{},{}\n",
            RECURRING_TAG,
            quote(&item.name),
            item.entry_type,
            item.amount
        ));
    }

    for tx in transactions {
        out.push_str(&format!(
            "{},{},,{},{},{}\n",
            TRANSACTION_TAG,
            tx.date,
            quote(&tx.category),
            tx.entry_type,
            tx.amount
        ));
    }

    out
}

/// Always wrap in quotes, doubling any embedded quote
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

// ============================================================================
// DECODE
// ============================================================================

/// Why a data row was left out of the import
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SkipReason {
    UnknownRecordType(String),
    MissingField(&'static str),
    InvalidAmount(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnknownRecordType(tag) => write!(f, "unknown record type `{}`", tag),
            SkipReason::MissingField(column) => write!(f, "missing {}", column),
            SkipReason::InvalidAmount(raw) => write!(f, "amount `{}` is not a number", raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    /// 1-based line number in the input text
    pub line: usize,
    pub reason: SkipReason,
}

/// Accepted candidates plus diagnostics for every dropped row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedBatch {
    pub transactions: Vec<Transaction>,
    pub recurring: Vec<RecurringItem>,
    pub skipped: Vec<SkippedRow>,
}

impl DecodedBatch {
    /// Rows accepted before any deduplication
    pub fn accepted_count(&self) -> usize {
        self.transactions.len() + self.recurring.len()
    }
}

/// Parse exported CSV text back into candidate records.
///
/// Fails only for an empty input or a first header other than `RecordType`.
/// Bad data rows are dropped and listed in [`DecodedBatch::skipped`].
/// Every accepted record gets a fresh id.
pub fn decode(text: &str) -> Result<DecodedBatch, CsvError> {
    let text = text.strip_prefix(BOM).unwrap_or(text);

    let lines: Vec<(usize, &str)> = text
        .split('\n')
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| (idx + 1, line))
        .collect();

    let Some(&(_, header_line)) = lines.first() else {
        return Err(CsvError::Empty);
    };

    let headers = split_row(header_line);
    let first = headers.first().map(String::as_str).unwrap_or("");
    if first != HEADERS[0] {
        return Err(CsvError::InvalidHeader {
            found: first.to_string(),
        });
    }

    let mut batch = DecodedBatch::default();

    for &(line, raw) in &lines[1..] {
        let fields = split_row(raw);

        match field(&fields, 0) {
            RECURRING_TAG => match recurring_from_row(&fields) {
                Ok(item) => batch.recurring.push(item),
                Err(reason) => skip(&mut batch, line, reason),
            },
            TRANSACTION_TAG => match transaction_from_row(&fields) {
                Ok(tx) => batch.transactions.push(tx),
                Err(reason) => skip(&mut batch, line, reason),
            },
            other => skip(&mut batch, line, SkipReason::UnknownRecordType(other.to_string())),
        }
    }

    tracing::info!(
        transactions = batch.transactions.len(),
        recurring = batch.recurring.len(),
        skipped = batch.skipped.len(),
        "decoded CSV"
    );

    Ok(batch)
}

fn skip(batch: &mut DecodedBatch, line: usize, reason: SkipReason) {
    tracing::debug!(line, %reason, "skipping CSV row");
    batch.skipped.push(SkippedRow { line, reason });
}

/// Split one line on commas outside quotes; quotes removed, `""` unescaped,
/// fields trimmed.
///
/// The line is already UTF-8 and the reader is flexible, so a read error
/// cannot occur; if one did, the row comes back with no fields and is
/// skipped as an unknown record type.
fn split_row(line: &str) -> Vec<String> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(line.as_bytes());

    let mut record = StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(_) => record.iter().map(str::to_string).collect(),
        Err(e) => {
            tracing::debug!(error = %e, "unreadable CSV line");
            Vec::new()
        }
    }
}

fn field(fields: &[String], index: usize) -> &str {
    fields.get(index).map(String::as_str).unwrap_or("")
}

fn required<'a>(fields: &'a [String], index: usize) -> Result<&'a str, SkipReason> {
    let value = field(fields, index);
    if value.is_empty() {
        Err(SkipReason::MissingField(HEADERS[index]))
    } else {
        Ok(value)
    }
}

/// Leading decimal number of `raw`, the rest ignored: `12abc` is 12 and
/// `1,000` is 1. No leading number, or a non-finite result, is `None`.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let text = raw.trim_start();
    let bytes = text.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - (end + 1);
        end = frac_end;
    }
    if mantissa_digits == 0 {
        return None;
    }

    // Exponent only counts when at least one digit follows it
    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+') | Some(b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    text[..end].parse::<f64>().ok().filter(|amount| amount.is_finite())
}

fn amount_from_row(fields: &[String]) -> Result<f64, SkipReason> {
    let raw = field(fields, COL_AMOUNT);
    parse_amount(raw).ok_or_else(|| SkipReason::InvalidAmount(raw.to_string()))
}

fn recurring_from_row(fields: &[String]) -> Result<RecurringItem, SkipReason> {
    let name = required(fields, COL_NAME)?;
    let amount = amount_from_row(fields)?;
    let entry_type = EntryType::from(field(fields, COL_TYPE));
    Ok(RecurringItem::new(name, entry_type, amount))
}

fn transaction_from_row(fields: &[String]) -> Result<Transaction, SkipReason> {
    let date = required(fields, COL_DATE)?;
    let category = required(fields, COL_CATEGORY)?;
    let amount = amount_from_row(fields)?;
    let entry_type = EntryType::from(field(fields, COL_TYPE));
    Ok(Transaction::new(date, entry_type, category, amount))
}
