//! Per-category page tables in SQLite / 分类页面索引
//!
//! Storage layout:
//! - `contracts`, `policies`, `iso`: one row per extracted page
//!   (filename, category, pagenumber, text), unique on (filename, pagenumber)
//! - `indexed_files`: one row per ingested document, primary key
//!   (category, filename). Ingestion inserts here first inside the same
//!   transaction as the pages, so two concurrent uploads of one file cannot
//!   both succeed.

use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::collections::HashSet;

use crate::error::IndexError;
use crate::models::{Category, CategoryFilter, DocumentEntry, PageText, SearchHit};
use crate::utils::like_pattern;

/// Document index over one SQLite database / 文档索引
#[derive(Clone)]
pub struct DocIndex {
    db: Pool<Sqlite>,
}

impl DocIndex {
    /// Open (or create) the database at `url` / 打开或创建数据库
    pub async fn connect(url: &str) -> Result<Self, IndexError> {
        let db = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(url)
            .await?;

        // WAL mode for concurrent readers during uploads
        sqlx::query("PRAGMA journal_mode=WAL").execute(&db).await?;
        sqlx::query("PRAGMA busy_timeout=5000").execute(&db).await?;
        sqlx::query("PRAGMA synchronous=NORMAL").execute(&db).await?;

        tracing::info!("Document index database opened: {} (WAL mode)", url);
        Ok(Self { db })
    }

    /// Use an existing connection pool / 使用现有连接池
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    /// Create tables if missing, existing rows are kept / 初始化表结构
    pub async fn init(&self) -> Result<(), IndexError> {
        for category in Category::ALL {
            let table = category.table();
            sqlx::query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    filename TEXT NOT NULL,
                    category TEXT NOT NULL,
                    pagenumber INTEGER NOT NULL,
                    text TEXT NOT NULL DEFAULT '',
                    UNIQUE(filename, pagenumber)
                )
                "#
            ))
            .execute(&self.db)
            .await?;

            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_filename ON {table}(filename)"
            ))
            .execute(&self.db)
            .await?;
        }

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS indexed_files (
                category TEXT NOT NULL,
                filename TEXT NOT NULL,
                pages INTEGER NOT NULL,
                indexed_at TEXT NOT NULL,
                PRIMARY KEY (category, filename)
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Whether a file already has rows in this category / 文件是否已索引
    ///
    /// Checks the page table as well as the guard table so databases filled
    /// before `indexed_files` existed are still honored.
    pub async fn is_indexed(&self, category: Category, filename: &str) -> Result<bool, IndexError> {
        let guarded: Option<(i64,)> = sqlx::query_as(
            "SELECT 1 FROM indexed_files WHERE category = ? AND filename = ?",
        )
        .bind(category.folder())
        .bind(filename)
        .fetch_optional(&self.db)
        .await?;
        if guarded.is_some() {
            return Ok(true);
        }

        let paged: Option<(i64,)> = sqlx::query_as(&format!(
            "SELECT 1 FROM {} WHERE filename = ? LIMIT 1",
            category.table()
        ))
        .bind(filename)
        .fetch_optional(&self.db)
        .await?;
        Ok(paged.is_some())
    }

    /// Insert every page of one document, all or nothing / 事务写入整份文档
    pub async fn insert_document(
        &self,
        category: Category,
        filename: &str,
        pages: &[PageText],
    ) -> Result<usize, IndexError> {
        let already = || IndexError::AlreadyIndexed {
            filename: filename.to_string(),
            category,
        };

        let mut tx = self.db.begin().await?;

        let legacy: Option<(i64,)> = sqlx::query_as(&format!(
            "SELECT 1 FROM {} WHERE filename = ? LIMIT 1",
            category.table()
        ))
        .bind(filename)
        .fetch_optional(&mut *tx)
        .await?;
        if legacy.is_some() {
            return Err(already());
        }

        let now = chrono::Utc::now().to_rfc3339();
        let guard = sqlx::query(
            "INSERT INTO indexed_files (category, filename, pages, indexed_at) VALUES (?, ?, ?, ?)",
        )
        .bind(category.folder())
        .bind(filename)
        .bind(pages.len() as i64)
        .bind(&now)
        .execute(&mut *tx)
        .await;

        match guard {
            Ok(_) => {}
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => return Err(already()),
            Err(e) => return Err(e.into()),
        }

        let insert = format!(
            "INSERT INTO {} (filename, category, pagenumber, text) VALUES (?, ?, ?, ?)",
            category.table()
        );
        for page in pages {
            sqlx::query(&insert)
                .bind(filename)
                .bind(category.folder())
                .bind(page.page_number as i64)
                .bind(&page.text)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        tracing::info!(
            "Indexed {} pages of {} into {}",
            pages.len(),
            filename,
            category.table()
        );
        Ok(pages.len())
    }

    /// Substring search over page text and filename / 关键词搜索
    ///
    /// The keyword is matched literally. Case folding follows SQLite's LIKE
    /// (ASCII case-insensitive).
    pub async fn search(&self, keyword: &str, filter: CategoryFilter) -> Result<Vec<SearchHit>, IndexError> {
        let categories = filter.categories();
        let selects: Vec<String> = categories
            .iter()
            .map(|c| {
                format!(
                    "SELECT filename, '{}' AS category, pagenumber FROM {} \
                     WHERE text LIKE ? ESCAPE '\\' OR filename LIKE ? ESCAPE '\\'",
                    c.folder(),
                    c.table()
                )
            })
            .collect();
        let sql = format!(
            "{} ORDER BY filename, category, pagenumber",
            selects.join(" UNION ")
        );
        tracing::debug!("Search query over {} table(s): {}", categories.len(), sql);

        let pattern = like_pattern(keyword);
        let mut query = sqlx::query_as::<_, SearchHit>(&sql);
        for _ in &categories {
            query = query.bind(pattern.clone()).bind(pattern.clone());
        }
        Ok(query.fetch_all(&self.db).await?)
    }

    /// One row per document, from page 1 of every table / 已索引文档列表
    ///
    /// A filename present in several categories is listed once (first
    /// category in table order), then rows are sorted by category.
    pub async fn list_documents(&self) -> Result<Vec<DocumentEntry>, IndexError> {
        let selects: Vec<String> = Category::ALL
            .iter()
            .map(|c| {
                format!(
                    "SELECT filename, '{}' AS category, pagenumber FROM {} WHERE pagenumber = 1",
                    c.folder(),
                    c.table()
                )
            })
            .collect();
        let hits: Vec<SearchHit> = sqlx::query_as(&selects.join(" UNION ALL "))
            .fetch_all(&self.db)
            .await?;

        let mut seen: HashSet<String> = HashSet::new();
        let mut unique: Vec<SearchHit> = hits
            .into_iter()
            .filter(|h| seen.insert(h.filename.clone()))
            .collect();
        unique.sort_by(|a, b| a.category.cmp(&b.category));

        Ok(unique
            .into_iter()
            .enumerate()
            .map(|(i, h)| DocumentEntry {
                serial: i + 1,
                filename: h.filename,
                category: h.category,
            })
            .collect())
    }

    /// Number of page rows stored for a document / 文档页数
    pub async fn page_count(&self, category: Category, filename: &str) -> Result<i64, IndexError> {
        let (count,): (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM {} WHERE filename = ?",
            category.table()
        ))
        .bind(filename)
        .fetch_one(&self.db)
        .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_index() -> DocIndex {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let index = DocIndex::new(pool);
        index.init().await.unwrap();
        index
    }

    fn pages(texts: &[&str]) -> Vec<PageText> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| PageText { page_number: i as u32 + 1, text: t.to_string() })
            .collect()
    }

    #[tokio::test]
    async fn test_insert_and_search_one_category() {
        let index = memory_index().await;
        index
            .insert_document(Category::Contracts, "lease.pdf", &pages(&["rent is due", "termination clause"]))
            .await
            .unwrap();

        let hits = index
            .search("TERMINATION", CategoryFilter::Only(Category::Contracts))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].page_number, 2);
        assert_eq!(hits[0].category, "Contracts");

        let none = index
            .search("termination", CategoryFilter::Only(Category::Policies))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_reupload_rejected_without_new_rows() {
        let index = memory_index().await;
        index
            .insert_document(Category::Policies, "travel.pdf", &pages(&["per diem"]))
            .await
            .unwrap();

        let err = index
            .insert_document(Category::Policies, "travel.pdf", &pages(&["per diem", "hotel"]))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "File travel.pdf is already present in Policies table.");
        assert_eq!(index.page_count(Category::Policies, "travel.pdf").await.unwrap(), 1);
        assert!(index.is_indexed(Category::Policies, "travel.pdf").await.unwrap());
        assert!(!index.is_indexed(Category::Iso, "travel.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_guard_row_blocks_second_insert() {
        let index = memory_index().await;
        // No page rows, so only the indexed_files key can reject the second insert
        index.insert_document(Category::Iso, "blank.pdf", &[]).await.unwrap();
        assert_eq!(index.page_count(Category::Iso, "blank.pdf").await.unwrap(), 0);

        let err = index
            .insert_document(Category::Iso, "blank.pdf", &pages(&["late page"]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IndexError::AlreadyIndexed { ref filename, category: Category::Iso } if filename == "blank.pdf"
        ));
        assert_eq!(index.page_count(Category::Iso, "blank.pdf").await.unwrap(), 0);
        assert!(index.is_indexed(Category::Iso, "blank.pdf").await.unwrap());

        index.insert_document(Category::Contracts, "blank.pdf", &pages(&["other table"])).await.unwrap();
        assert_eq!(index.page_count(Category::Contracts, "blank.pdf").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_search_all_is_union() {
        let index = memory_index().await;
        index
            .insert_document(Category::Contracts, "a.pdf", &pages(&["audit scope", "audit fees"]))
            .await
            .unwrap();
        index
            .insert_document(Category::Iso, "a.pdf", &pages(&["internal audit"]))
            .await
            .unwrap();
        index
            .insert_document(Category::Policies, "b.pdf", &pages(&["nothing here"]))
            .await
            .unwrap();

        let all = index.search("audit", CategoryFilter::All).await.unwrap();
        let mut expected = index
            .search("audit", CategoryFilter::Only(Category::Contracts))
            .await
            .unwrap();
        expected.extend(index.search("audit", CategoryFilter::Only(Category::Iso)).await.unwrap());
        assert_eq!(all.len(), 3);
        for hit in &expected {
            assert!(all.contains(hit));
        }
    }

    #[tokio::test]
    async fn test_keyword_is_literal() {
        let index = memory_index().await;
        index
            .insert_document(Category::Policies, "p.pdf", &pages(&["100% refund", "1000 refund"]))
            .await
            .unwrap();
        let hits = index.search("100%", CategoryFilter::All).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].page_number, 1);
    }

    #[tokio::test]
    async fn test_filename_matches() {
        let index = memory_index().await;
        index
            .insert_document(Category::Iso, "iso-9001.pdf", &pages(&["quality", "manual"]))
            .await
            .unwrap();
        let hits = index.search("9001", CategoryFilter::All).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_list_documents_dedups_by_filename() {
        let index = memory_index().await;
        index
            .insert_document(Category::Policies, "shared.pdf", &pages(&["x", "y"]))
            .await
            .unwrap();
        index
            .insert_document(Category::Contracts, "shared.pdf", &pages(&["x"]))
            .await
            .unwrap();
        index
            .insert_document(Category::Iso, "iso.pdf", &pages(&["z"]))
            .await
            .unwrap();

        let docs = index.list_documents().await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].serial, 1);
        assert_eq!(docs[0].filename, "shared.pdf");
        assert_eq!(docs[0].category, "Contracts");
        assert_eq!(docs[1].category, "ISO");
    }
}
