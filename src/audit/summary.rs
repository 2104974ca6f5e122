//! Yearly totals and amount formatting / 年度汇总
//!
//! Feeds the transaction and amount trend charts: one point per year with a
//! pre-formatted label.

use serde::Serialize;
use std::collections::BTreeMap;

use super::record::TransactionRecord;

/// One point of the yearly trend / 年度数据点
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSummary {
    pub year: i32,
    pub label: String,
    pub transactions: usize,
    pub amount: f64,
    pub amount_label: String,
}

/// Count and sum per year, optionally restricted to a category and a set of years.
/// Records without a year are skipped, missing amounts count as zero.
pub fn yearly_summary(
    records: &[TransactionRecord],
    category: Option<&str>,
    years: &[i32],
) -> Vec<YearSummary> {
    let mut totals: BTreeMap<i32, (usize, f64)> = BTreeMap::new();
    for record in records {
        let Some(year) = record.year else { continue };
        if !years.is_empty() && !years.contains(&year) {
            continue;
        }
        if let Some(wanted) = category {
            if record.category.as_deref() != Some(wanted) {
                continue;
            }
        }
        let entry = totals.entry(year).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += record.amount.unwrap_or(0.0);
    }

    totals
        .into_iter()
        .map(|(year, (transactions, amount))| YearSummary {
            year,
            label: fiscal_year_label(year),
            transactions,
            amount,
            amount_label: format_amount(amount),
        })
        .collect()
}

/// `202324` → `2023-24`, anything else unchanged / 财年标签
pub fn fiscal_year_label(year: i32) -> String {
    let text = year.to_string();
    if text.len() >= 6 && text.chars().all(|c| c.is_ascii_digit()) {
        format!("{}-{}", &text[..4], &text[4..6])
    } else {
        text
    }
}

/// Indian currency units: lakhs for 6-7 digit amounts, crores above / 金额格式化
pub fn format_amount(amount: f64) -> String {
    let digits = (amount.trunc().abs() as u64).to_string().len();
    if digits > 7 {
        format!("₹ {} crs", group_thousands(amount / 10_000_000.0))
    } else if digits > 5 {
        format!("₹ {} lks", group_thousands(amount / 100_000.0))
    } else {
        format!("₹ {}", group_thousands(amount))
    }
}

/// Two decimals with comma thousands separators / 千分位
fn group_thousands(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        "-"
    } else {
        ""
    };
    format!("{}{}.{}", sign, grouped, frac_part)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(year: i32, category: &str, amount: f64) -> TransactionRecord {
        TransactionRecord {
            year: Some(year),
            category: Some(category.to_string()),
            amount: Some(amount),
            ..Default::default()
        }
    }

    #[test]
    fn test_format_amount_units() {
        assert_eq!(format_amount(1234.5), "₹ 1,234.50");
        assert_eq!(format_amount(99_999.0), "₹ 99,999.00");
        assert_eq!(format_amount(250_000.0), "₹ 2.50 lks");
        assert_eq!(format_amount(9_999_999.0), "₹ 100.00 lks");
        assert_eq!(format_amount(123_456_789.0), "₹ 12.35 crs");
        assert_eq!(format_amount(0.0), "₹ 0.00");
    }

    #[test]
    fn test_fiscal_year_label() {
        assert_eq!(fiscal_year_label(202324), "2023-24");
        assert_eq!(fiscal_year_label(2024), "2024");
    }

    #[test]
    fn test_yearly_summary_filters() {
        let records = vec![
            rec(2023, "Travel", 100.0),
            rec(2023, "Travel", 50.0),
            rec(2024, "Travel", 10.0),
            rec(2024, "Meals", 999.0),
            TransactionRecord::default(),
        ];
        let all = yearly_summary(&records, None, &[]);
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].transactions, 2);

        let travel = yearly_summary(&records, Some("Travel"), &[2023]);
        assert_eq!(travel.len(), 1);
        assert_eq!(travel[0].transactions, 2);
        assert_eq!(travel[0].amount, 150.0);
        assert_eq!(travel[0].amount_label, "₹ 150.00");
    }
}
