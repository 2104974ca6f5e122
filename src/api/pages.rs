//! Server-rendered HTML pages / 服务端HTML页面

use crate::models::DocumentEntry;
use crate::search::ResultGroup;
use crate::utils::escape_html;

const BASE_STYLE: &str = r#"
    body { font-family: Arial, sans-serif; background-color: rgb(240, 240, 240); margin: 0; padding: 0; }
    h1 { text-align: center; padding: 20px 0; font-size: 24px; }
    table { width: 80%; margin: 0 auto; border-collapse: collapse; border: 1px solid #ddd; }
    th, td { padding: 12px; text-align: center; border: 1px solid #ddd; }
    th { background-color: #f2f2f2; text-transform: uppercase; }
"#;

fn layout(title: &str, extra_style: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{BASE_STYLE}{extra_style}</style>
</head>
<body>
{body}
</body>
</html>
"#
    )
}

/// Search form plus upload form / 搜索与上传表单
pub fn home_page() -> String {
    let style = r#"
    form { width: 30%; background-color: rgba(220, 220, 220, 0.5); margin: 5% auto 0; padding: 2%; border-radius: 10px; }
    label { font-weight: bold; display: block; margin-bottom: 1%; }
    input[type="text"], select { padding: 2%; width: 100%; box-sizing: border-box; margin-bottom: 2%; font-size: 16px; }
    input[type="submit"], input[type="button"] { padding: 2% 5%; background-color: #007bff; color: white; border: none; border-radius: 5px; display: block; margin: 2% auto 0; cursor: pointer; }
    .icon { display: block; width: 25%; margin: 0 auto; }
"#;
    let body = r#"<img src="/static/logo.png" class="icon" alt="">
<h1>CONTRACTS, POLICIES, ISO SEARCH BOT</h1>
<form action="/search" method="get">
    <label for="keywords">KEYWORDS:</label>
    <input type="text" id="keywords" name="keywords" required>
    <label for="category">CATEGORY:</label>
    <select id="category" name="category">
        <option value="All">All</option>
        <option value="Contracts">Contracts</option>
        <option value="Policies">Policies</option>
        <option value="ISO">ISO</option>
    </select>
    <input type="submit" value="Search">
    <input type="button" value="Index" onclick="location.href='/index_page';">
</form>
<form action="/upload" method="post" enctype="multipart/form-data">
    <label for="upload-category">UPLOAD TO:</label>
    <select id="upload-category" name="category">
        <option value="Policies">Policies</option>
        <option value="Contracts">Contracts</option>
        <option value="ISO">ISO</option>
    </select>
    <input type="file" name="file" accept=".pdf" required>
    <input type="submit" value="Upload">
</form>"#;
    layout("Search Interface", style, body)
}

/// Grouped result tables, collapsed until the title is clicked / 分组结果页
pub fn results_page(groups: &[ResultGroup]) -> String {
    let style = r#"
    .group table { display: none; }
    .group.active table { display: table; }
    .group h2 { cursor: pointer; margin-left: 10%; }
"#;
    let mut body = String::from("<h1>Search Results</h1>\n");
    for (i, group) in groups.iter().enumerate() {
        body.push_str(&format!(
            "<div class=\"group\"><h2>{}. {}</h2><table>\
             <tr><th>S.NO</th><th>filename</th><th>category</th><th>pagenumber</th>\
             <th>View Page</th><th>Download</th></tr>",
            i + 1,
            escape_html(&group.title)
        ));
        for row in &group.rows {
            body.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                row.serial,
                escape_html(&row.filename),
                escape_html(&row.category),
                row.page_number,
                row.view_page,
                row.download
            ));
        }
        body.push_str("</table></div>\n");
    }
    body.push_str(
        r#"<script>
document.querySelectorAll('.group h2').forEach(function (title) {
    title.addEventListener('click', function () { title.parentNode.classList.toggle('active'); });
});
</script>"#,
    );
    layout("Search Results", style, &body)
}

/// Explicit empty-result page / 无结果页面
pub fn no_results_page(keywords: &str) -> String {
    let body = format!(
        "<h1>Search Results</h1>\n<p>No results found for keywords '{}' in the selected category.</p>",
        escape_html(keywords)
    );
    layout("Search Results", "", &body)
}

/// Indexed documents listing / 已索引文档列表
pub fn index_listing_page(documents: &[DocumentEntry]) -> String {
    let mut body = String::from(
        "<h1>Indexed Documents</h1>\n<table><tr><th>S.NO</th><th>filename</th><th>category</th></tr>",
    );
    for doc in documents {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            doc.serial,
            escape_html(&doc.filename),
            escape_html(&doc.category)
        ));
    }
    body.push_str("</table>");
    layout("Index Page", "", &body)
}

/// Single message page for uploads and sentinels / 消息页面
pub fn message_page(title: &str, message: &str) -> String {
    let body = format!("<h1>{}</h1>\n<p>{}</p>", escape_html(title), escape_html(message));
    layout(title, "", &body)
}

/// Page wrapping an already-rendered link or sentinel / 包装下载链接
pub fn download_page(link_html: &str) -> String {
    layout("Download", "", &format!("<h1>Download</h1>\n<p>{}</p>", link_html))
}
