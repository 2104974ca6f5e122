//! Duplicate / similarity filter pipeline / 重复与相似交易筛选
//!
//! Criteria run in the order they are given. Each one narrows the rows left
//! by the previous one, and the grouping criteria (`duplicate_subset` and both
//! invoice scans) only see those rows, so selection order is part of the
//! request. `duplicate_subset` then `near_duplicate_invoice` can keep rows
//! that the reverse order drops.
//!
//! The near-duplicate scan compares every pair of remaining rows. That is
//! fine for the few hundred rows a payment export holds; larger batches should
//! be bucketed by a normalized invoice prefix before pairing.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use super::holidays::HolidayCalendar;
use super::record::{Column, TransactionBatch, TransactionRecord};
use super::similarity::{is_near_duplicate, strip_special};
use crate::error::AuditError;

/// Default ratio for near-duplicate invoices / 默认相似度阈值
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;

/// One selected filter / 筛选条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Criterion {
    /// Every adjacent pair of the columns holds equal values / 相邻列值相等
    ColumnPairEquality { columns: Vec<Column> },
    /// Rows sharing all these values with at least one other row / 多列重复
    DuplicateSubset { columns: Vec<Column> },
    /// Posting date falls on a holiday / 节假日过账
    HolidayPosting,
    /// Invoice numbers equal once special characters are removed / 去特殊字符后相同
    SpecialCharacterInvoice,
    /// Stripped-equal or similar-as-written invoice numbers / 近似发票号
    NearDuplicateInvoice,
}

impl Criterion {
    /// Columns this criterion contributes to the sort order / 排序列
    fn sort_columns(&self) -> Vec<Column> {
        match self {
            Criterion::ColumnPairEquality { columns } | Criterion::DuplicateSubset { columns } => {
                columns.clone()
            }
            Criterion::HolidayPosting => vec![Column::PostingDate],
            Criterion::SpecialCharacterInvoice | Criterion::NearDuplicateInvoice => {
                vec![Column::InvoiceNumber]
            }
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Criterion::ColumnPairEquality { .. } => "column_pair_equality",
            Criterion::DuplicateSubset { .. } => "duplicate_subset",
            Criterion::HolidayPosting => "holiday_posting",
            Criterion::SpecialCharacterInvoice => "special_character_invoice",
            Criterion::NearDuplicateInvoice => "near_duplicate_invoice",
        }
    }
}

/// Output row numbered from 1 / 输出行（从1编号）
#[derive(Debug, Clone, Serialize)]
pub struct IndexedRecord {
    pub index: usize,
    #[serde(flatten)]
    pub record: TransactionRecord,
}

/// Filtered and sorted result / 筛选结果
#[derive(Debug, Clone, Serialize)]
pub struct FilterReport {
    pub sort_columns: Vec<Column>,
    pub extra_columns: Vec<String>,
    pub total: usize,
    pub rows: Vec<IndexedRecord>,
}

/// Ordered set of criteria plus the similarity threshold / 筛选器
#[derive(Debug, Clone)]
pub struct AuditFilter {
    criteria: Vec<Criterion>,
    threshold: f64,
}

impl AuditFilter {
    pub fn new(criteria: Vec<Criterion>) -> Self {
        Self {
            criteria,
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sort keys: criterion columns in selection order, then reimbursement ID and cost center / 排序键
    pub fn sort_columns(&self) -> Vec<Column> {
        let mut columns: Vec<Column> = Vec::new();
        for column in self.criteria.iter().flat_map(Criterion::sort_columns) {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
        for tie_break in [Column::ReimbursementId, Column::CostCenter] {
            if !columns.contains(&tie_break) {
                columns.push(tie_break);
            }
        }
        columns
    }

    fn validate(&self) -> Result<(), AuditError> {
        if self.criteria.is_empty() {
            return Err(AuditError::EmptySelection);
        }
        for criterion in &self.criteria {
            match criterion {
                Criterion::ColumnPairEquality { columns } if columns.len() < 2 => {
                    return Err(AuditError::InsufficientCriteria { selected: columns.len() });
                }
                Criterion::DuplicateSubset { columns } if columns.is_empty() => {
                    return Err(AuditError::EmptySelection);
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Run every criterion in order, then sort and number the survivors / 执行筛选
    pub fn apply(
        &self,
        batch: &TransactionBatch,
        holidays: &HolidayCalendar,
    ) -> Result<FilterReport, AuditError> {
        self.validate()?;

        let mut rows: Vec<TransactionRecord> = batch.records.clone();
        for criterion in &self.criteria {
            let before = rows.len();
            rows = match criterion {
                Criterion::ColumnPairEquality { columns } => column_pair_equality(rows, columns),
                Criterion::DuplicateSubset { columns } => duplicate_subset(rows, columns),
                Criterion::HolidayPosting => holiday_posting(rows, holidays),
                Criterion::SpecialCharacterInvoice => special_character_invoice(rows),
                Criterion::NearDuplicateInvoice => near_duplicate_invoice(rows, self.threshold),
            };
            tracing::debug!("{}: {} -> {} rows", criterion.name(), before, rows.len());
        }

        let sort_columns = self.sort_columns();
        sort_records(&mut rows, &sort_columns);

        tracing::info!(
            "Audit filter kept {} of {} rows ({} criteria)",
            rows.len(),
            batch.len(),
            self.criteria.len()
        );

        let rows: Vec<IndexedRecord> = rows
            .into_iter()
            .enumerate()
            .map(|(i, record)| IndexedRecord { index: i + 1, record })
            .collect();

        Ok(FilterReport {
            sort_columns,
            extra_columns: batch.extra_columns.clone(),
            total: rows.len(),
            rows,
        })
    }
}

fn column_pair_equality(rows: Vec<TransactionRecord>, columns: &[Column]) -> Vec<TransactionRecord> {
    rows.into_iter()
        .filter(|r| {
            columns
                .windows(2)
                .all(|pair| pair[0].value(r).matches(&pair[1].value(r)))
        })
        .collect()
}

fn subset_key(record: &TransactionRecord, columns: &[Column]) -> Vec<String> {
    columns.iter().map(|c| c.value(record).key()).collect()
}

fn duplicate_subset(rows: Vec<TransactionRecord>, columns: &[Column]) -> Vec<TransactionRecord> {
    let mut counts: HashMap<Vec<String>, usize> = HashMap::new();
    for record in &rows {
        *counts.entry(subset_key(record, columns)).or_insert(0) += 1;
    }
    rows.into_iter()
        .filter(|r| counts.get(&subset_key(r, columns)).copied().unwrap_or(0) > 1)
        .collect()
}

fn holiday_posting(rows: Vec<TransactionRecord>, holidays: &HolidayCalendar) -> Vec<TransactionRecord> {
    rows.into_iter()
        .filter(|r| r.posting_date.map_or(false, |d| holidays.contains(&d)))
        .collect()
}

/// Keep the last row (by posting date) per exact invoice, then keep invoices
/// whose stripped form collides with another remaining invoice.
fn special_character_invoice(rows: Vec<TransactionRecord>) -> Vec<TransactionRecord> {
    let mut rows: Vec<TransactionRecord> = rows
        .into_iter()
        .filter(|r| r.invoice_number.is_some())
        .collect();
    sort_records(&mut rows, &[Column::InvoiceNumber, Column::PostingDate]);

    let mut last_by_invoice: HashMap<String, usize> = HashMap::new();
    for (i, record) in rows.iter().enumerate() {
        if let Some(invoice) = &record.invoice_number {
            last_by_invoice.insert(invoice.clone(), i);
        }
    }
    let keep: HashSet<usize> = last_by_invoice.into_values().collect();
    let deduped: Vec<TransactionRecord> = rows
        .into_iter()
        .enumerate()
        .filter(|(i, _)| keep.contains(i))
        .map(|(_, r)| r)
        .collect();

    let mut stripped_counts: HashMap<String, usize> = HashMap::new();
    for record in &deduped {
        if let Some(invoice) = &record.invoice_number {
            let stripped = strip_special(invoice);
            if !stripped.is_empty() {
                *stripped_counts.entry(stripped).or_insert(0) += 1;
            }
        }
    }
    deduped
        .into_iter()
        .filter(|r| {
            r.invoice_number
                .as_deref()
                .map(strip_special)
                .and_then(|s| stripped_counts.get(&s).copied())
                .unwrap_or(0)
                > 1
        })
        .collect()
}

/// All-pairs scan; both rows of a matching pair are kept.
fn near_duplicate_invoice(rows: Vec<TransactionRecord>, threshold: f64) -> Vec<TransactionRecord> {
    let mut matched = vec![false; rows.len()];
    for i in 0..rows.len() {
        let Some(a) = rows[i].invoice_number.as_deref() else { continue };
        for j in (i + 1)..rows.len() {
            let Some(b) = rows[j].invoice_number.as_deref() else { continue };
            if is_near_duplicate(a, b, threshold) {
                matched[i] = true;
                matched[j] = true;
            }
        }
    }
    rows.into_iter()
        .zip(matched)
        .filter_map(|(r, keep)| keep.then_some(r))
        .collect()
}

/// Stable ascending sort, missing values last / 稳定升序排序
fn sort_records(rows: &mut [TransactionRecord], columns: &[Column]) {
    rows.sort_by(|a, b| compare_on(columns, a, b));
}

/// Compare two records on a sort key tuple / 按排序键比较
pub fn compare_on(columns: &[Column], a: &TransactionRecord, b: &TransactionRecord) -> Ordering {
    columns
        .iter()
        .map(|c| c.value(a).sort_cmp(&c.value(b)))
        .find(|o| *o != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}
