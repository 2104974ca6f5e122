//! Transaction audit endpoints / 交易审计接口
//!
//! All three take a multipart form with the workbook under `file`. Parsing and
//! filtering run on the blocking pool.

use axum::{
    body::Body,
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::api::ApiResponse;
use crate::audit::{
    self, load_sheet_from_bytes, normalize, report_to_csv, AuditFilter, Criterion, FilterReport,
    HolidayCalendar, TransactionBatch, YearSummary, EXPORT_FILENAME,
};
use crate::error::AuditError;
use crate::state::AppState;

#[derive(Debug, Default)]
struct AuditForm {
    file: Option<(String, Vec<u8>)>,
    criteria: Option<String>,
    category: Option<String>,
    years: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<AuditForm, String> {
    let mut form = AuditForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Malformed form: {}", e))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field.bytes().await.map_err(|e| format!("Malformed form: {}", e))?;
                form.file = Some((filename, data.to_vec()));
            }
            "criteria" | "category" | "years" => {
                let text = field.text().await.map_err(|e| format!("Malformed form: {}", e))?;
                let slot = match name.as_str() {
                    "criteria" => &mut form.criteria,
                    "category" => &mut form.category,
                    _ => &mut form.years,
                };
                *slot = Some(text);
            }
            _ => {}
        }
    }
    Ok(form)
}

/// Criteria arrive as a JSON list / 解析筛选条件
fn parse_criteria(text: Option<&str>) -> Result<Vec<Criterion>, String> {
    let text = text.map(str::trim).unwrap_or("");
    if text.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(text).map_err(|e| format!("Invalid criteria: {}", e))
}

/// Years as a JSON list or comma separated / 解析年份列表
fn parse_years(text: Option<&str>) -> Result<Vec<i32>, String> {
    let text = text.map(str::trim).unwrap_or("");
    if text.is_empty() {
        return Ok(Vec::new());
    }
    if text.starts_with('[') {
        return serde_json::from_str(text).map_err(|e| format!("Invalid years: {}", e));
    }
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i32>().map_err(|_| format!("Invalid year: {}", s)))
        .collect()
}

/// Load and normalize the uploaded workbook on the blocking pool / 读取并规范化
async fn load_batch(file: Option<(String, Vec<u8>)>) -> Result<TransactionBatch, String> {
    let (filename, bytes) = file.ok_or_else(|| "No file part".to_string())?;
    if filename.trim().is_empty() {
        return Err("No selected file".to_string());
    }
    let batch = tokio::task::spawn_blocking(move || {
        load_sheet_from_bytes(&filename, bytes).map(|sheet| normalize(&sheet))
    })
    .await
    .map_err(|e| format!("Workbook task failed: {}", e))?
    .map_err(|e| e.to_string())?;

    tracing::info!("Loaded {} transactions from upload", batch.len());
    Ok(batch)
}

async fn run_filter(
    form: AuditForm,
    holidays: Arc<HolidayCalendar>,
    threshold: f64,
) -> Result<FilterReport, String> {
    let criteria = parse_criteria(form.criteria.as_deref())?;
    if criteria.is_empty() {
        return Err(AuditError::EmptySelection.to_string());
    }
    let batch = load_batch(form.file).await?;
    let filter = AuditFilter::new(criteria).with_threshold(threshold);

    tokio::task::spawn_blocking(move || filter.apply(&batch, &holidays))
        .await
        .map_err(|e| format!("Filter task failed: {}", e))?
        .map_err(|e| e.to_string())
}

/// POST /api/audit/filter - 筛选交易
pub async fn filter_transactions(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Json<ApiResponse<FilterReport>> {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(message) => return Json(ApiResponse::error(&message)),
    };
    match run_filter(form, state.holidays.clone(), state.config.audit.similarity_threshold).await {
        Ok(report) => Json(ApiResponse::success(report)),
        Err(message) => Json(ApiResponse::error(&message)),
    }
}

/// POST /api/audit/export - 导出CSV
pub async fn export_transactions(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(message) => return Json(ApiResponse::<()>::error(&message)).into_response(),
    };
    let report = match run_filter(form, state.holidays.clone(), state.config.audit.similarity_threshold).await {
        Ok(report) => report,
        Err(message) => return Json(ApiResponse::<()>::error(&message)).into_response(),
    };
    let csv = match report_to_csv(&report) {
        Ok(csv) => csv,
        Err(e) => {
            tracing::error!("CSV export failed: {}", e);
            return Json(ApiResponse::<()>::error(&e.to_string())).into_response();
        }
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", EXPORT_FILENAME),
        )
        .body(Body::from(csv))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// POST /api/audit/summary - 年度汇总
pub async fn summarize_transactions(multipart: Multipart) -> Json<ApiResponse<Vec<YearSummary>>> {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(message) => return Json(ApiResponse::error(&message)),
    };
    let years = match parse_years(form.years.as_deref()) {
        Ok(years) => years,
        Err(message) => return Json(ApiResponse::error(&message)),
    };
    let category = form
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    match load_batch(form.file).await {
        Ok(batch) => Json(ApiResponse::success(audit::yearly_summary(
            &batch.records,
            category.as_deref(),
            &years,
        ))),
        Err(message) => Json(ApiResponse::error(&message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_years() {
        assert_eq!(parse_years(None), Ok(vec![]));
        assert_eq!(parse_years(Some("2023, 2024")), Ok(vec![2023, 2024]));
        assert_eq!(parse_years(Some("[202223,202324]")), Ok(vec![202223, 202324]));
        assert!(parse_years(Some("twenty")).is_err());
    }

    #[test]
    fn test_parse_criteria() {
        assert_eq!(parse_criteria(Some("")), Ok(vec![]));
        assert_eq!(
            parse_criteria(Some(r#"[{"kind":"holiday_posting"}]"#)),
            Ok(vec![Criterion::HolidayPosting])
        );
        assert!(parse_criteria(Some(r#"[{"kind":"bogus"}]"#)).is_err());
    }
}
