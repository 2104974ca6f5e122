//! Raw sheet loading from spreadsheets and CSV / 读取原始表格
//!
//! Only the first worksheet is read and its first row is the header.

use calamine::{Data, Reader};
use std::io::Cursor;
use std::path::Path;

use crate::error::AuditError;
use crate::utils::get_ext;

/// Untyped cell as read from the file / 原始单元格
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Excel serial date (days since 1899-12-30, fraction is time of day)
    DateTime(f64),
}

/// Header plus rows / 表头与数据行
#[derive(Debug, Clone, Default)]
pub struct RawSheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawCell>>,
}

impl RawSheet {
    /// Build from text rows, blank strings become empty cells / 由文本行构造
    pub fn from_text_rows(headers: &[&str], rows: &[Vec<&str>]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|v| text_cell(v)).collect())
                .collect(),
        }
    }

    /// Index of a header, case-insensitive / 查找表头位置
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    }
}

fn text_cell(value: &str) -> RawCell {
    if value.trim().is_empty() {
        RawCell::Empty
    } else {
        RawCell::Text(value.to_string())
    }
}

fn raw_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Empty | Data::Error(_) => RawCell::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => text_cell(s),
        Data::Float(f) => RawCell::Number(*f),
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Bool(b) => RawCell::Bool(*b),
        Data::DateTime(dt) => RawCell::DateTime(dt.as_f64()),
    }
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

fn from_range(range: &calamine::Range<Data>) -> RawSheet {
    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(first) => first.iter().map(header_text).collect(),
        None => return RawSheet::default(),
    };
    let rows = rows
        .filter(|row| row.iter().any(|c| !matches!(c, Data::Empty)))
        .map(|row| row.iter().map(raw_cell).collect())
        .collect();
    RawSheet { headers, rows }
}

fn read_csv<R: std::io::Read>(reader: R) -> Result<RawSheet, AuditError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if record.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(text_cell).collect());
    }
    Ok(RawSheet { headers, rows })
}

fn is_spreadsheet(ext: &str) -> bool {
    matches!(ext, "xlsx" | "xlsm" | "xlsb" | "xls" | "ods")
}

/// Load the first sheet of a workbook or CSV file on disk / 从文件读取
pub fn load_sheet_from_path(path: &Path) -> Result<RawSheet, AuditError> {
    let ext = get_ext(&path.to_string_lossy());
    if ext == "csv" {
        let file = std::fs::File::open(path)?;
        return read_csv(file);
    }
    if !is_spreadsheet(&ext) {
        return Err(AuditError::UnsupportedWorkbook(path.display().to_string()));
    }

    let mut workbook = calamine::open_workbook_auto(path)
        .map_err(|e| AuditError::Workbook(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AuditError::Workbook("workbook has no sheets".to_string()))?
        .map_err(|e| AuditError::Workbook(e.to_string()))?;
    Ok(from_range(&range))
}

/// Load the first sheet of an uploaded file / 从上传内容读取
pub fn load_sheet_from_bytes(filename: &str, bytes: Vec<u8>) -> Result<RawSheet, AuditError> {
    let ext = get_ext(filename);
    if ext == "csv" {
        return read_csv(Cursor::new(bytes));
    }
    if !is_spreadsheet(&ext) {
        return Err(AuditError::UnsupportedWorkbook(filename.to_string()));
    }

    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| AuditError::Workbook(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AuditError::Workbook("workbook has no sheets".to_string()))?
        .map_err(|e| AuditError::Workbook(e.to_string()))?;
    Ok(from_range(&range))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_from_bytes() {
        let csv = "Vendor,Amount,Pstng Date\nAcme,100,2024-01-26\n,,\nGlobex, ,bad\n";
        let sheet = load_sheet_from_bytes("payments.csv", csv.as_bytes().to_vec()).unwrap();
        assert_eq!(sheet.headers, vec!["Vendor", "Amount", "Pstng Date"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[1][1], RawCell::Empty);
        assert_eq!(sheet.rows[1][2], RawCell::Text("bad".to_string()));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_sheet_from_bytes("notes.txt", b"hello".to_vec()).unwrap_err();
        assert!(matches!(err, AuditError::UnsupportedWorkbook(_)));
    }

    #[test]
    fn test_csv_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("holidays.csv");
        std::fs::write(&path, "date,name\n2024-01-26,Republic Day\n").unwrap();
        let sheet = load_sheet_from_path(&path).unwrap();
        assert_eq!(sheet.column_index("DATE"), Some(0));
        assert_eq!(sheet.rows.len(), 1);
    }
}
