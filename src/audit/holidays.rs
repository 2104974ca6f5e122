//! Holiday calendar, loaded once at startup / 节假日表

use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::path::Path;

use super::normalize::parse_date;
use super::sheet::{load_sheet_from_path, RawSheet};
use crate::error::AuditError;

/// Immutable set of holiday dates / 节假日集合
#[derive(Debug, Clone, Default)]
pub struct HolidayCalendar {
    dates: BTreeSet<NaiveDate>,
}

impl HolidayCalendar {
    pub fn new<I: IntoIterator<Item = NaiveDate>>(dates: I) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }

    /// Read the `date` column (or the first column) of a sheet / 读取date列
    pub fn from_sheet(sheet: &RawSheet) -> Self {
        let idx = sheet.column_index("date").unwrap_or(0);
        Self::new(sheet.rows.iter().filter_map(|row| row.get(idx).and_then(parse_date)))
    }

    pub fn load(path: &Path) -> Result<Self, AuditError> {
        let sheet = load_sheet_from_path(path)?;
        Ok(Self::from_sheet(&sheet))
    }

    /// Missing or unreadable calendars fall back to an empty set / 读取失败时返回空集合
    pub fn load_or_empty(path: &Path) -> Self {
        if !path.exists() {
            tracing::warn!("Holiday calendar not found at {:?}, holiday filter will match nothing", path);
            return Self::default();
        }
        match Self::load(path) {
            Ok(calendar) => {
                tracing::info!("Loaded {} holiday dates from {:?}", calendar.len(), path);
                calendar
            }
            Err(e) => {
                tracing::warn!("Failed to load holiday calendar {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.dates.contains(date)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}
