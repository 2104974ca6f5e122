//! Column normalizer: raw sheet → typed transaction batch / 列规范化
//!
//! Date and time cells that do not parse become `None`. Nothing here fails on
//! bad data; the only output is the returned batch.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use super::record::{format_number, Column, TransactionBatch, TransactionRecord};
use super::sheet::{RawCell, RawSheet};

/// Largest Excel serial that maps to a real date (9999-12-31) / Excel最大日期序号
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
];

fn excel_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default()
}

/// Excel serial → date / Excel序号转日期
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_EXCEL_SERIAL {
        return None;
    }
    excel_epoch().checked_add_signed(Duration::days(serial.trunc() as i64))
}

/// Fraction of a day → time of day / 小数天转时间
fn day_fraction_to_time(fraction: f64) -> Option<NaiveTime> {
    if !fraction.is_finite() || fraction < 0.0 {
        return None;
    }
    let secs = (fraction.fract() * 86_400.0).round() as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(secs.min(86_399), 0)
}

/// Parse a date text in any accepted layout / 解析日期文本
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.date());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

/// Parse a date cell / 解析日期单元格
pub fn parse_date(cell: &RawCell) -> Option<NaiveDate> {
    match cell {
        RawCell::Number(n) | RawCell::DateTime(n) => excel_serial_to_date(*n),
        RawCell::Text(s) => parse_date_text(s),
        RawCell::Empty | RawCell::Bool(_) => None,
    }
}

/// Parse a time cell, text must be HH:MM:SS / 解析时间单元格
pub fn parse_time(cell: &RawCell) -> Option<NaiveTime> {
    match cell {
        RawCell::Text(s) => {
            let s = s.trim();
            NaiveTime::parse_from_str(s, "%H:%M:%S")
                .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S%.f"))
                .ok()
        }
        RawCell::DateTime(n) => day_fraction_to_time(*n),
        RawCell::Number(n) if (0.0..1.0).contains(n) => day_fraction_to_time(*n),
        _ => None,
    }
}

/// Render any cell as trimmed text / 转为文本
pub fn cell_text(cell: &RawCell) -> Option<String> {
    match cell {
        RawCell::Empty => None,
        RawCell::Text(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        RawCell::Number(n) => Some(format_number(*n)),
        RawCell::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
        RawCell::DateTime(n) => excel_serial_to_date(*n).map(|d| d.format("%Y-%m-%d").to_string()),
    }
}

fn parse_amount(cell: &RawCell) -> Option<f64> {
    match cell {
        RawCell::Number(n) => Some(*n),
        RawCell::Text(s) => s.trim().replace(',', "").parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// G/L codes drop everything from the first "." (sub-codes and float artifacts) / 去掉科目子码
pub fn normalize_gl_code(cell: &RawCell) -> Option<String> {
    let text = match cell {
        RawCell::Number(n) => n.to_string(),
        other => cell_text(other)?,
    };
    let code = match text.find('.') {
        Some(pos) => &text[..pos],
        None => text.as_str(),
    };
    Some(code.to_string())
}

fn assign(record: &mut TransactionRecord, column: &Column, cell: &RawCell) {
    match column {
        Column::Vendor => record.vendor = cell_text(cell),
        Column::Amount => record.amount = parse_amount(cell),
        Column::GlCode => record.gl_code = normalize_gl_code(cell),
        Column::InvoiceNumber => record.invoice_number = cell_text(cell),
        Column::CostCenter => record.cost_center = cell_text(cell),
        Column::ReimbursementId => record.reimbursement_id = cell_text(cell),
        Column::Category => record.category = cell_text(cell),
        Column::DocumentDate => record.document_date = parse_date(cell),
        Column::PostingDate => record.posting_date = parse_date(cell),
        Column::EnteredOn => record.entered_on = parse_date(cell),
        Column::UpdatedOn => record.updated_on = parse_date(cell),
        Column::VerifiedOn => record.verified_on = parse_date(cell),
        Column::ApprovedOn => record.approved_on = parse_date(cell),
        Column::ClearingDate => record.clearing_date = parse_date(cell),
        Column::EntryTime => record.entry_time = parse_time(cell),
        Column::UpdatedAt => record.updated_at = parse_time(cell),
        Column::VerifiedAt => record.verified_at = parse_time(cell),
        Column::ApprovedAt => record.approved_at = parse_time(cell),
        // Derived from posting date, the sheet's own value is dropped
        Column::Year => {}
        Column::Other(name) => {
            if let Some(text) = cell_text(cell) {
                record.extra.insert(name.clone(), text);
            }
        }
    }
}

/// Normalize a raw sheet into typed records / 规范化整张表
pub fn normalize(sheet: &RawSheet) -> TransactionBatch {
    let columns: Vec<Option<Column>> = sheet
        .headers
        .iter()
        .map(|h| (!h.trim().is_empty()).then(|| Column::from_header(h)))
        .collect();

    let extra_columns = columns
        .iter()
        .flatten()
        .filter_map(|c| match c {
            Column::Other(name) => Some(name.clone()),
            _ => None,
        })
        .collect();

    let records = sheet
        .rows
        .iter()
        .map(|row| {
            let mut record = TransactionRecord::default();
            for (column, cell) in columns.iter().zip(row.iter()) {
                if let Some(column) = column {
                    assign(&mut record, column, cell);
                }
            }
            record.year = record.posting_date.map(|d| d.year());
            record
        })
        .collect();

    TransactionBatch { records, extra_columns }
}
