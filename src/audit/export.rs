//! CSV export of a filter report / 导出CSV

use super::filter::FilterReport;
use super::record::Column;
use crate::error::AuditError;

/// Download name for exported reports / 导出文件名
pub const EXPORT_FILENAME: &str = "Transactions_with_same_column.csv";

/// Write the report as CSV: `S.NO`, the known columns, then extra sheet columns.
pub fn report_to_csv(report: &FilterReport) -> Result<Vec<u8>, AuditError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header: Vec<String> = vec!["S.NO".to_string()];
    header.extend(Column::KNOWN.iter().map(|c| c.header().to_string()));
    header.extend(report.extra_columns.iter().cloned());
    writer.write_record(&header)?;

    let extras: Vec<Column> = report
        .extra_columns
        .iter()
        .map(|name| Column::Other(name.clone()))
        .collect();

    for row in &report.rows {
        let mut line: Vec<String> = vec![row.index.to_string()];
        line.extend(
            Column::KNOWN
                .iter()
                .chain(extras.iter())
                .map(|c| c.value(&row.record).to_string()),
        );
        writer.write_record(&line)?;
    }

    writer
        .into_inner()
        .map_err(|e| AuditError::Io(e.into_error()))
}
