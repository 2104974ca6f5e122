//! Payment audit: normalize an uploaded sheet, then filter it for suspicious
//! transactions / 交易审计

pub mod export;
pub mod filter;
pub mod holidays;
pub mod normalize;
pub mod record;
pub mod sheet;
pub mod similarity;
pub mod summary;

pub use export::{report_to_csv, EXPORT_FILENAME};
pub use filter::{AuditFilter, Criterion, FilterReport, IndexedRecord};
pub use holidays::HolidayCalendar;
pub use normalize::normalize;
pub use record::{CellValue, Column, TransactionBatch, TransactionRecord};
pub use sheet::{load_sheet_from_bytes, load_sheet_from_path, RawCell, RawSheet};
pub use summary::{yearly_summary, YearSummary};
