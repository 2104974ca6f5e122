use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Document category, one table and one folder each / 文档分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Contracts,
    Policies,
    #[serde(rename = "ISO")]
    Iso,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Contracts, Category::Policies, Category::Iso];

    /// Display name, also the folder name on disk / 显示名称
    pub fn folder(&self) -> &'static str {
        match self {
            Category::Contracts => "Contracts",
            Category::Policies => "Policies",
            Category::Iso => "ISO",
        }
    }

    /// Backing table name / 对应表名
    pub fn table(&self) -> &'static str {
        match self {
            Category::Contracts => "contracts",
            Category::Policies => "policies",
            Category::Iso => "iso",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Contracts" | "contracts" => Ok(Category::Contracts),
            "Policies" | "policies" => Ok(Category::Policies),
            "ISO" | "iso" | "Iso" => Ok(Category::Iso),
            other => Err(other.to_string()),
        }
    }
}

/// Category selector for searches / 搜索分类过滤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Only(Category),
}

impl CategoryFilter {
    /// Empty and "All" both mean every category / 空值与All均表示全部
    pub fn parse(value: Option<&str>) -> Result<Self, String> {
        match value.map(str::trim) {
            None | Some("") | Some("All") | Some("all") => Ok(CategoryFilter::All),
            Some(other) => other.parse().map(CategoryFilter::Only),
        }
    }

    pub fn categories(&self) -> Vec<Category> {
        match self {
            CategoryFilter::All => Category::ALL.to_vec(),
            CategoryFilter::Only(c) => vec![*c],
        }
    }
}

/// One extracted page ready for insertion / 待写入的页面
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
}

/// Matched (document, page) pair / 搜索命中
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct SearchHit {
    pub filename: String,
    pub category: String,
    #[sqlx(rename = "pagenumber")]
    pub page_number: i64,
}

/// Search hit decorated with preview and download links / 带链接的搜索结果
#[derive(Debug, Clone, Serialize)]
pub struct SearchResultRow {
    pub serial: usize,
    pub filename: String,
    pub category: String,
    pub page_number: i64,
    pub view_page: String,
    pub download: String,
}

/// Row of the index listing page / 索引列表行
#[derive(Debug, Clone, Serialize)]
pub struct DocumentEntry {
    pub serial: usize,
    pub filename: String,
    pub category: String,
}
