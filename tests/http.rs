//! End-to-end HTTP tests against the router, with a fake page renderer

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use sqlx::sqlite::SqlitePoolOptions;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use auditdesk::audit::HolidayCalendar;
use auditdesk::config::AppConfig;
use auditdesk::error::IndexError;
use auditdesk::ingest::PageRenderer;
use auditdesk::models::PageText;
use auditdesk::search::DocIndex;
use auditdesk::{build_router, AppState};

const BOUNDARY: &str = "auditdesk-test-boundary";

struct FakeRenderer;

impl PageRenderer for FakeRenderer {
    fn render(&self, _pdf: &Path, out_dir: &Path) -> Result<Vec<PageText>, IndexError> {
        std::fs::create_dir_all(out_dir)?;
        let texts = ["Travel policy overview", "Per diem rates for domestic travel"];
        let mut pages = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            let number = i as u32 + 1;
            std::fs::write(out_dir.join(format!("{}.png", number)), b"\x89PNG fake")?;
            pages.push(PageText { page_number: number, text: text.to_string() });
        }
        Ok(pages)
    }
}

async fn app(dir: &TempDir) -> Router {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let index = DocIndex::new(pool);
    index.init().await.unwrap();

    let mut config = AppConfig::default();
    let root = dir.path();
    config.storage.documents_dir = root.join("documents").to_string_lossy().to_string();
    config.storage.images_dir = root.join("images").to_string_lossy().to_string();
    config.storage.static_dir = root.join("static").to_string_lossy().to_string();

    let holidays = HolidayCalendar::new([chrono::NaiveDate::from_ymd_opt(2024, 1, 26).unwrap()]);
    let state = AppState::new(config, index, holidays, Arc::new(FakeRenderer));
    build_router(Arc::new(state))
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

fn multipart(uri: &str, parts: &[Part]) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n", name, value)
                        .as_bytes(),
                );
            }
            Part::File(name, filename, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&bytes).to_string())
}

#[tokio::test]
async fn health_check_reports_ok() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir).await;
    let (status, body) = send(&app, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"status\":\"ok\""));
}

#[tokio::test]
async fn upload_search_and_reupload() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir).await;

    let upload = || {
        multipart(
            "/upload",
            &[Part::File("file", "Travel Policy.pdf", b"%PDF-1.4 fake")],
        )
    };

    let (status, body) = send(&app, upload()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Inserted text from Travel_Policy.pdf in category Policies into database."));

    let (status, body) = send(&app, upload()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("File Travel_Policy.pdf is already present in Policies table."));

    let (status, body) = send(&app, get("/search?keywords=per%20diem&category=All")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Travel_Policy - Policies"));
    assert!(body.contains("/view_image/Policies/Travel_Policy/2"));
    assert!(body.contains("/files/Policies/Travel_Policy.pdf"));

    let (_, body) = send(&app, get("/search?keywords=per%20diem&category=ISO")).await;
    assert!(body.contains("No results found for keywords 'per diem'"));

    let (_, body) = send(&app, get("/index_page")).await;
    assert!(body.contains("<td>1</td><td>Travel_Policy.pdf</td><td>Policies</td>"));
}

#[tokio::test]
async fn upload_rejects_non_pdf_and_bad_category() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir).await;

    let (status, body) = send(&app, multipart("/upload", &[Part::File("file", "notes.txt", b"hi")])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Only PDF files can be indexed."));

    let (status, body) = send(
        &app,
        multipart(
            "/upload",
            &[Part::Text("category", "Memos"), Part::File("file", "a.pdf", b"%PDF")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid category: Memos"));

    let (status, body) = send(&app, multipart("/upload", &[Part::Text("category", "ISO")])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("No file part"));
}

#[tokio::test]
async fn page_images_and_files() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir).await;
    let upload = multipart(
        "/upload",
        &[Part::Text("category", "ISO"), Part::File("file", "manual.pdf", b"%PDF-1.4 manual")],
    );
    send(&app, upload).await;

    let response = app.clone().oneshot(get("/view_image/ISO/manual.pdf/1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");

    let (status, body) = send(&app, get("/view_image/ISO/manual/9")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.starts_with("Image not found at path:"));

    let (status, body) = send(&app, get("/files/ISO/manual.pdf")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "%PDF-1.4 manual");

    let (_, body) = send(&app, get("/download/ISO/manual.pdf")).await;
    assert!(body.contains("data:application/octet-stream;base64,"));

    let (_, body) = send(&app, get("/download/Memos/manual.pdf")).await;
    assert!(body.contains("Invalid category: Memos"));

    let (_, body) = send(&app, get("/download/Contracts/manual.pdf")).await;
    assert!(body.contains("File not found: "));
}

#[tokio::test]
async fn download_escapes_category_in_message() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir).await;

    let response = app
        .clone()
        .oneshot(get("/download/%3Cscript%3Ealert(1)%3C%2Fscript%3E/a.pdf"))
        .await
        .unwrap();
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = String::from_utf8_lossy(&bytes).to_string();
    assert!(!body.contains("<script>alert(1)"));
    assert!(body.contains("Invalid category: &lt;script&gt;alert(1)&lt;/script&gt;"));
}

const PAYMENTS_CSV: &str = "\
Vendor,Amount,Invoice Number,Cost Center,Reimbursement ID,Pstng Date,Verified on,HOG Approval on,Category
Acme,1000,INV-100,CC1,R3,2024-01-26,2024-01-20,2024-01-20,Travel
Acme,1000,INV100,CC1,R1,2024-01-27,2024-01-20,2024-01-21,Travel
Globex,250,GX-7,CC2,R2,2024-02-01,,,Meals
";

#[tokio::test]
async fn audit_filter_and_errors() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir).await;

    let request = multipart(
        "/api/audit/filter",
        &[
            Part::Text("criteria", r#"[{"kind":"column_pair_equality","columns":["Verified on"]}]"#),
            Part::File("file", "payments.csv", PAYMENTS_CSV.as_bytes()),
        ],
    );
    let (_, body) = send(&app, request).await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["code"], 400);
    assert!(json["message"].as_str().unwrap().contains("Please select another column"));

    let request = multipart(
        "/api/audit/filter",
        &[
            Part::Text("criteria", r#"[{"kind":"near_duplicate_invoice"}]"#),
            Part::File("file", "payments.csv", PAYMENTS_CSV.as_bytes()),
        ],
    );
    let (_, body) = send(&app, request).await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["code"], 200);
    let rows = json["data"]["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["index"], 1);
    assert_eq!(rows[0]["invoice_number"], "INV-100");
    assert_eq!(rows[1]["index"], 2);

    let request = multipart(
        "/api/audit/filter",
        &[
            Part::Text("criteria", r#"[{"kind":"holiday_posting"}]"#),
            Part::File("file", "payments.csv", PAYMENTS_CSV.as_bytes()),
        ],
    );
    let (_, body) = send(&app, request).await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["data"]["total"], 1);
    assert_eq!(json["data"]["rows"][0]["reimbursement_id"], "R3");

    let request = multipart(
        "/api/audit/filter",
        &[Part::File("file", "payments.csv", PAYMENTS_CSV.as_bytes())],
    );
    let (_, body) = send(&app, request).await;
    assert!(body.contains("No filter criteria selected"));
}

#[tokio::test]
async fn audit_export_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir).await;

    let request = multipart(
        "/api/audit/export",
        &[
            Part::Text("criteria", r#"[{"kind":"duplicate_subset","columns":["Vendor","Amount"]}]"#),
            Part::File("file", "payments.csv", PAYMENTS_CSV.as_bytes()),
        ],
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Transactions_with_same_column.csv\""
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8_lossy(&bytes).to_string();
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].starts_with("S.NO,"));
    assert_eq!(lines.len(), 3);
    // Sorted by vendor, amount, then reimbursement ID
    assert!(lines[1].starts_with("1,Acme,1000,"));
    assert!(lines[1].contains(",R1,"));

    let request = multipart(
        "/api/audit/summary",
        &[
            Part::Text("category", "Travel"),
            Part::Text("years", "2024"),
            Part::File("file", "payments.csv", PAYMENTS_CSV.as_bytes()),
        ],
    );
    let (_, body) = send(&app, request).await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    let summary = json["data"].as_array().unwrap();
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0]["transactions"], 2);
    assert_eq!(summary[0]["amount_label"], "₹ 2,000.00");
}
