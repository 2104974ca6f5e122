//! Result row links: page preview and original file / 结果链接
//!
//! Missing targets are reported as plain sentinel text in place of the link.

use base64::Engine;

use crate::config::AppConfig;
use crate::error::IndexError;
use crate::models::Category;
use crate::utils::{escape_html, strip_pdf_ext};

pub const IMAGE_NOT_FOUND: &str = "Image not found";
pub const CATEGORY_EMPTY: &str = "Category is empty.";

/// Link to the rendered page image, or "Image not found" / 页面预览链接
pub fn view_page_link(config: &AppConfig, category: Category, filename: &str, page: i64) -> String {
    let stem = strip_pdf_ext(filename);
    let exists = u32::try_from(page)
        .map(|p| config.get_page_image_path(category, &stem, p).exists())
        .unwrap_or(false);
    if !exists {
        return IMAGE_NOT_FOUND.to_string();
    }
    format!(
        r#"<a href="/view_image/{}/{}/{}" target="_blank">View Page</a>"#,
        category.folder(),
        urlencoding::encode(&stem),
        page
    )
}

/// Resolve a category name the way the download endpoint reports it / 解析下载分类
pub fn resolve_category(category: &str) -> Result<Category, String> {
    if category.trim().is_empty() {
        return Err(CATEGORY_EMPTY.to_string());
    }
    category
        .parse::<Category>()
        .map_err(|name| IndexError::InvalidCategory(name).to_string())
}

/// Outcome of building a download link / 下载链接结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadLink {
    /// Ready-made anchor markup
    Link(String),
    /// Plain message shown in place of the link
    Sentinel(String),
}

impl DownloadLink {
    /// Markup for an HTML page; sentinel text is escaped / 转为HTML
    pub fn to_html(&self) -> String {
        match self {
            DownloadLink::Link(html) => html.clone(),
            DownloadLink::Sentinel(message) => escape_html(message),
        }
    }
}

/// Inline base64 download anchor, or a sentinel message / 内联下载链接
pub fn download_link(config: &AppConfig, category: &str, filename: &str) -> DownloadLink {
    let category = match resolve_category(category) {
        Ok(c) => c,
        Err(message) => return DownloadLink::Sentinel(message),
    };
    let path = config.get_category_dir(category).join(filename);
    match std::fs::read(&path) {
        Ok(bytes) => {
            let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
            let name = escape_html(filename);
            DownloadLink::Link(format!(
                r#"<a href="data:application/octet-stream;base64,{}" download="{}">Download {}</a>"#,
                b64, name, name
            ))
        }
        Err(_) => DownloadLink::Sentinel(format!("File not found: {}", path.display())),
    }
}

/// Link to the streamed original, or a sentinel message / 原文件链接
pub fn file_link(config: &AppConfig, category: Category, filename: &str) -> String {
    let path = config.get_category_dir(category).join(filename);
    if !path.is_file() {
        return escape_html(&format!("File not found: {}", path.display()));
    }
    format!(
        r#"<a href="/files/{}/{}">Download {}</a>"#,
        category.folder(),
        urlencoding::encode(filename),
        escape_html(filename)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &std::path::Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.storage.documents_dir = dir.join("documents").to_string_lossy().to_string();
        config.storage.images_dir = dir.join("images").to_string_lossy().to_string();
        config
    }

    #[test]
    fn test_view_page_link() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        assert_eq!(view_page_link(&config, Category::Iso, "manual.pdf", 2), IMAGE_NOT_FOUND);

        let image_dir = config.get_page_image_dir(Category::Iso, "manual");
        std::fs::create_dir_all(&image_dir).unwrap();
        std::fs::write(image_dir.join("2.png"), b"png").unwrap();
        assert_eq!(
            view_page_link(&config, Category::Iso, "manual.pdf", 2),
            r#"<a href="/view_image/ISO/manual/2" target="_blank">View Page</a>"#
        );
        assert_eq!(view_page_link(&config, Category::Iso, "manual.pdf", -1), IMAGE_NOT_FOUND);
    }

    #[test]
    fn test_download_link_sentinels() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        assert_eq!(
            download_link(&config, "", "a.pdf"),
            DownloadLink::Sentinel("Category is empty.".to_string())
        );
        assert_eq!(
            download_link(&config, "Memos", "a.pdf"),
            DownloadLink::Sentinel("Invalid category: Memos".to_string())
        );
        assert!(download_link(&config, "Policies", "a.pdf")
            .to_html()
            .starts_with("File not found: "));

        let folder = config.get_category_dir(Category::Policies);
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(folder.join("a.pdf"), b"hi").unwrap();
        assert_eq!(
            download_link(&config, "Policies", "a.pdf").to_html(),
            r#"<a href="data:application/octet-stream;base64,aGk=" download="a.pdf">Download a.pdf</a>"#
        );
        assert!(file_link(&config, Category::Policies, "a.pdf").starts_with(r#"<a href="/files/Policies/a.pdf""#));
    }

    #[test]
    fn test_sentinel_text_is_escaped() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let link = download_link(&config, "<script>alert(1)</script>", "a.pdf");
        assert_eq!(
            link,
            DownloadLink::Sentinel("Invalid category: <script>alert(1)</script>".to_string())
        );
        assert_eq!(link.to_html(), "Invalid category: &lt;script&gt;alert(1)&lt;/script&gt;");
    }
}
