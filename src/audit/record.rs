//! Typed transaction records and column addressing / 交易记录与列定义

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// One normalized payment record. Unparseable cells are `None`, never raw text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransactionRecord {
    pub vendor: Option<String>,
    pub amount: Option<f64>,
    pub gl_code: Option<String>,
    pub invoice_number: Option<String>,
    pub cost_center: Option<String>,
    pub reimbursement_id: Option<String>,
    pub category: Option<String>,
    pub document_date: Option<NaiveDate>,
    pub posting_date: Option<NaiveDate>,
    pub entered_on: Option<NaiveDate>,
    pub updated_on: Option<NaiveDate>,
    pub verified_on: Option<NaiveDate>,
    pub approved_on: Option<NaiveDate>,
    pub clearing_date: Option<NaiveDate>,
    pub entry_time: Option<NaiveTime>,
    pub updated_at: Option<NaiveTime>,
    pub verified_at: Option<NaiveTime>,
    pub approved_at: Option<NaiveTime>,
    pub year: Option<i32>,
    /// Columns the normalizer does not know, kept as text / 未识别列
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

/// Normalized sheet / 规范化后的数据
#[derive(Debug, Clone, Default)]
pub struct TransactionBatch {
    pub records: Vec<TransactionRecord>,
    /// Extra column headers in sheet order / 额外列（按表头顺序）
    pub extra_columns: Vec<String>,
}

impl TransactionBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Addressable column, named by its sheet header on the wire / 列标识
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Column {
    Vendor,
    Amount,
    GlCode,
    InvoiceNumber,
    CostCenter,
    ReimbursementId,
    Category,
    DocumentDate,
    PostingDate,
    EnteredOn,
    UpdatedOn,
    VerifiedOn,
    ApprovedOn,
    ClearingDate,
    EntryTime,
    UpdatedAt,
    VerifiedAt,
    ApprovedAt,
    Year,
    Other(String),
}

impl Column {
    /// Known columns in export order / 已知列（导出顺序）
    pub const KNOWN: [Column; 19] = [
        Column::Vendor,
        Column::Amount,
        Column::GlCode,
        Column::InvoiceNumber,
        Column::CostCenter,
        Column::ReimbursementId,
        Column::Category,
        Column::DocumentDate,
        Column::PostingDate,
        Column::EnteredOn,
        Column::UpdatedOn,
        Column::VerifiedOn,
        Column::ApprovedOn,
        Column::ClearingDate,
        Column::EntryTime,
        Column::UpdatedAt,
        Column::VerifiedAt,
        Column::ApprovedAt,
        Column::Year,
    ];

    /// Canonical sheet header / 标准表头
    pub fn header(&self) -> &str {
        match self {
            Column::Vendor => "Vendor",
            Column::Amount => "Amount",
            Column::GlCode => "G/L",
            Column::InvoiceNumber => "Invoice Number",
            Column::CostCenter => "Cost Center",
            Column::ReimbursementId => "Reimbursement ID",
            Column::Category => "Category",
            Column::DocumentDate => "Doc. Date",
            Column::PostingDate => "Pstng Date",
            Column::EnteredOn => "On",
            Column::UpdatedOn => "Updated on",
            Column::VerifiedOn => "Verified on",
            Column::ApprovedOn => "HOG Approval on",
            Column::ClearingDate => "Clearing date",
            Column::EntryTime => "Time",
            Column::UpdatedAt => "Updated at",
            Column::VerifiedAt => "Verified at",
            Column::ApprovedAt => "HOG Approval at",
            Column::Year => "year",
            Column::Other(name) => name,
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Column::GlCode => &["gl", "g/l account", "gl code"],
            Column::DocumentDate => &["document date"],
            Column::PostingDate => &["posting date"],
            Column::EnteredOn => &["entered on"],
            Column::ApprovedOn => &["approved on"],
            Column::EntryTime => &["entry time"],
            Column::ApprovedAt => &["approved at"],
            _ => &[],
        }
    }

    /// Resolve a header, case-insensitive with aliases / 解析表头
    pub fn from_header(header: &str) -> Column {
        let wanted = header.trim().to_lowercase();
        Column::KNOWN
            .iter()
            .find(|c| c.header().to_lowercase() == wanted || c.aliases().iter().any(|a| *a == wanted))
            .cloned()
            .unwrap_or_else(|| Column::Other(header.trim().to_string()))
    }

    /// Read this column from a record / 读取单元格
    pub fn value(&self, record: &TransactionRecord) -> CellValue {
        fn text(v: &Option<String>) -> CellValue {
            v.clone().map(CellValue::Text).unwrap_or(CellValue::Missing)
        }
        fn date(v: &Option<NaiveDate>) -> CellValue {
            v.map(CellValue::Date).unwrap_or(CellValue::Missing)
        }
        fn time(v: &Option<NaiveTime>) -> CellValue {
            v.map(CellValue::Time).unwrap_or(CellValue::Missing)
        }

        match self {
            Column::Vendor => text(&record.vendor),
            Column::Amount => record.amount.map(CellValue::Number).unwrap_or(CellValue::Missing),
            Column::GlCode => text(&record.gl_code),
            Column::InvoiceNumber => text(&record.invoice_number),
            Column::CostCenter => text(&record.cost_center),
            Column::ReimbursementId => text(&record.reimbursement_id),
            Column::Category => text(&record.category),
            Column::DocumentDate => date(&record.document_date),
            Column::PostingDate => date(&record.posting_date),
            Column::EnteredOn => date(&record.entered_on),
            Column::UpdatedOn => date(&record.updated_on),
            Column::VerifiedOn => date(&record.verified_on),
            Column::ApprovedOn => date(&record.approved_on),
            Column::ClearingDate => date(&record.clearing_date),
            Column::EntryTime => time(&record.entry_time),
            Column::UpdatedAt => time(&record.updated_at),
            Column::VerifiedAt => time(&record.verified_at),
            Column::ApprovedAt => time(&record.approved_at),
            Column::Year => record.year.map(|y| CellValue::Number(y as f64)).unwrap_or(CellValue::Missing),
            Column::Other(name) => record
                .extra
                .get(name)
                .cloned()
                .map(CellValue::Text)
                .unwrap_or(CellValue::Missing),
        }
    }
}

impl From<String> for Column {
    fn from(header: String) -> Self {
        Column::from_header(&header)
    }
}

impl From<Column> for String {
    fn from(column: Column) -> Self {
        column.header().to_string()
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// Single typed cell / 单元格值
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Missing,
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Time(NaiveTime),
}

impl CellValue {
    fn rank(&self) -> u8 {
        match self {
            CellValue::Number(_) => 0,
            CellValue::Date(_) => 1,
            CellValue::Time(_) => 2,
            CellValue::Text(_) => 3,
            CellValue::Missing => 4,
        }
    }

    /// Equality where a missing cell never matches anything / 缺失值永不相等
    pub fn matches(&self, other: &CellValue) -> bool {
        !matches!(self, CellValue::Missing) && self == other
    }

    /// Grouping key, missing cells group together / 分组键
    pub fn key(&self) -> String {
        match self {
            CellValue::Missing => "\u{0}missing".to_string(),
            CellValue::Number(n) => format!("n:{}", n.to_bits()),
            other => format!("{}:{}", other.rank(), other),
        }
    }

    /// Ascending order with missing cells last / 升序，缺失值排最后
    pub fn sort_cmp(&self, other: &CellValue) -> Ordering {
        match (self, other) {
            (CellValue::Number(a), CellValue::Number(b)) => a.total_cmp(b),
            (CellValue::Date(a), CellValue::Date(b)) => a.cmp(b),
            (CellValue::Time(a), CellValue::Time(b)) => a.cmp(b),
            (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Missing => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => f.write_str(&format_number(*n)),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
        }
    }
}

/// Whole numbers render without a trailing ".0" / 整数不带小数点
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_header_aliases() {
        assert_eq!(Column::from_header("Pstng Date"), Column::PostingDate);
        assert_eq!(Column::from_header("posting date"), Column::PostingDate);
        assert_eq!(Column::from_header(" INVOICE NUMBER "), Column::InvoiceNumber);
        assert_eq!(Column::from_header("Entered by"), Column::Other("Entered by".to_string()));
    }

    #[test]
    fn test_column_serde_uses_headers() {
        let cols: Vec<Column> = serde_json::from_str(r#"["Vendor","G/L","Entered by"]"#).unwrap();
        assert_eq!(cols, vec![Column::Vendor, Column::GlCode, Column::Other("Entered by".into())]);
        assert_eq!(serde_json::to_string(&Column::ReimbursementId).unwrap(), r#""Reimbursement ID""#);
    }

    #[test]
    fn test_missing_never_matches() {
        assert!(!CellValue::Missing.matches(&CellValue::Missing));
        assert!(CellValue::Text("A".into()).matches(&CellValue::Text("A".into())));
        assert_eq!(CellValue::Missing.key(), CellValue::Missing.key());
    }

    #[test]
    fn test_sort_missing_last() {
        let a = CellValue::Text("b".into());
        assert_eq!(a.sort_cmp(&CellValue::Missing), Ordering::Less);
        assert_eq!(CellValue::Missing.sort_cmp(&a), Ordering::Greater);
        assert_eq!(CellValue::Number(2.0).sort_cmp(&CellValue::Number(10.0)), Ordering::Less);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(400100.0), "400100");
        assert_eq!(format_number(12.5), "12.5");
    }
}
