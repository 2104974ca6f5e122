//! Keyword search over indexed document pages / 文档关键词搜索
//!
//! - `index`: SQLite tables and query composition
//! - `links`: preview / download links attached to each hit

pub mod index;
pub mod links;

pub use index::DocIndex;

use serde::Serialize;

use crate::config::AppConfig;
use crate::error::IndexError;
use crate::models::{Category, SearchHit, SearchResultRow};
use crate::utils::{escape_html, strip_pdf_ext};

/// Hits for one (filename, category) pair / 按文档分组的结果
#[derive(Debug, Clone, Serialize)]
pub struct ResultGroup {
    pub title: String,
    pub filename: String,
    pub category: String,
    pub rows: Vec<SearchResultRow>,
}

/// Number hits from 1 and attach links / 编号并附加链接
pub fn annotate(config: &AppConfig, hits: Vec<SearchHit>) -> Vec<SearchResultRow> {
    hits.into_iter()
        .enumerate()
        .map(|(i, hit)| {
            let (view_page, download) = match hit.category.parse::<Category>() {
                Ok(category) => (
                    links::view_page_link(config, category, &hit.filename, hit.page_number),
                    links::file_link(config, category, &hit.filename),
                ),
                Err(name) => {
                    let message = escape_html(&IndexError::InvalidCategory(name).to_string());
                    (links::IMAGE_NOT_FOUND.to_string(), message)
                }
            };
            SearchResultRow {
                serial: i + 1,
                filename: hit.filename,
                category: hit.category,
                page_number: hit.page_number,
                view_page,
                download,
            }
        })
        .collect()
}

/// Group rows by (filename, category), groups in key order / 按文档分组
pub fn group_results(rows: Vec<SearchResultRow>) -> Vec<ResultGroup> {
    let mut groups: Vec<ResultGroup> = Vec::new();
    for row in rows {
        match groups
            .iter_mut()
            .find(|g| g.filename == row.filename && g.category == row.category)
        {
            Some(group) => group.rows.push(row),
            None => groups.push(ResultGroup {
                title: format!("{} - {}", strip_pdf_ext(&row.filename), row.category),
                filename: row.filename.clone(),
                category: row.category.clone(),
                rows: vec![row],
            }),
        }
    }
    groups.sort_by(|a, b| (&a.filename, &a.category).cmp(&(&b.filename, &b.category)));
    groups
}
