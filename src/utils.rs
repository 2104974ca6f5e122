/// Filename and text helpers / 文件名与文本工具函数

use once_cell::sync::Lazy;
use regex::Regex;

static PDF_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.pdf$").unwrap());
static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]+").unwrap());

/// Make an uploaded filename safe to use on disk / 清理上传文件名
/// 1. Drop any directory part (both / and \) / 去掉目录部分
/// 2. Replace runs of whitespace and unsafe characters with _ / 替换不安全字符
/// 3. Trim leading dots and underscores / 去掉开头的点和下划线
pub fn secure_filename(name: &str) -> String {
    let name = name.replace('\\', "/");
    let base = name.rsplit('/').next().unwrap_or("");
    let cleaned = UNSAFE_CHARS.replace_all(base.trim(), "_");
    cleaned.trim_start_matches(|c| c == '.' || c == '_').to_string()
}

/// Get file extension (lowercase) / 获取文件扩展名
pub fn get_ext(path: &str) -> String {
    std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Filename without a trailing .pdf, used for image folders and group titles / 去掉.pdf后缀
pub fn strip_pdf_ext(filename: &str) -> String {
    PDF_SUFFIX.replace(filename, "").into_owned()
}

/// Escape text for HTML bodies and attribute values / HTML转义
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap a keyword as a literal LIKE pattern (ESCAPE '\') / 构造字面量LIKE模式
pub fn like_pattern(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_filename() {
        assert_eq!(secure_filename("report.pdf"), "report.pdf");
        assert_eq!(secure_filename("../../etc/passwd"), "passwd");
        assert_eq!(secure_filename("C:\\Users\\me\\My Policy.pdf"), "My_Policy.pdf");
        assert_eq!(secure_filename("..hidden.pdf"), "hidden.pdf");
        assert_eq!(secure_filename("a b;c.pdf"), "a_b_c.pdf");
        assert_eq!(secure_filename("/"), "");
    }

    #[test]
    fn test_strip_pdf_ext() {
        assert_eq!(strip_pdf_ext("policy.pdf"), "policy");
        assert_eq!(strip_pdf_ext("policy.PDF"), "policy");
        assert_eq!(strip_pdf_ext("policy.pdf.bak"), "policy.pdf.bak");
    }

    #[test]
    fn test_get_ext() {
        assert_eq!(get_ext("Book.XLSX"), "xlsx");
        assert_eq!(get_ext("noext"), "");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>\"R&D\"</b>"), "&lt;b&gt;&quot;R&amp;D&quot;&lt;/b&gt;");
    }

    #[test]
    fn test_like_pattern() {
        assert_eq!(like_pattern("iso"), "%iso%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
