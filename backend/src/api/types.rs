//! REST API types for dashboard integration.
//!
//! The engine's report structures serialize as-is; this module adds the
//! upload envelope and error shape the browser client expects.

use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::report::DashboardReport;

/// Response sent to the dashboard after an upload and full recompute.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Unique job identifier
    pub job_id: String,

    /// Status: "ready" or "warning"
    pub status: String,

    /// All five aggregated views plus filter options and metadata
    pub report: DashboardReport,

    /// Upload metadata
    pub metadata: ResponseMetadata,
}

/// Metadata about the processed sheet
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    /// Total rows normalized from the sheet
    pub total_rows: usize,

    /// Rows surviving the active filters
    pub filtered_rows: usize,

    /// Detected encoding
    pub encoding: String,

    /// Detected delimiter
    pub delimiter: String,

    /// Canonicalized column headers
    pub columns: Vec<String>,
}

impl From<DashboardReport> for UploadResponse {
    fn from(report: DashboardReport) -> Self {
        // A view with zero rows in the current filter state is worth a
        // heads-up, not an error.
        let status = if report.filtered_row_count == 0 {
            "warning"
        } else {
            "ready"
        };

        let metadata = ResponseMetadata {
            total_rows: report.sheet_info.row_count,
            filtered_rows: report.filtered_row_count,
            encoding: report.sheet_info.encoding.clone(),
            delimiter: report.sheet_info.delimiter.to_string(),
            columns: report.sheet_info.headers.clone(),
        };

        UploadResponse {
            job_id: Uuid::new_v4().to_string(),
            status: status.to_string(),
            report,
            metadata,
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{build_report_from_bytes, ReportOptions};

    const SHEET: &str = "\
Animal Id,Common Name,Ingredient Name,Type,Ingredient Qty,Base UOM Name,Meal Time,Date
A-1,Gorilla,Banana,Fruit,2.0,kg,8:00 AM,2024-01-01
";

    #[test]
    fn test_upload_response_envelope() {
        let report =
            build_report_from_bytes(SHEET.as_bytes(), ReportOptions::default()).unwrap();
        let response = UploadResponse::from(report);

        assert_eq!(response.status, "ready");
        assert_eq!(response.metadata.total_rows, 1);
        assert_eq!(response.metadata.filtered_rows, 1);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json["jobId"].is_string());
        assert_eq!(json["metadata"]["delimiter"], ",");
        assert_eq!(json["report"]["ingredient_types"]["data"][0]["group_name"], "Fruit");
    }

    #[test]
    fn test_warning_status_when_filters_empty_the_view() {
        let options = ReportOptions {
            filters: crate::models::FilterState {
                sites: vec!["Nowhere".into()],
                ..Default::default()
            },
            ..Default::default()
        };
        let report = build_report_from_bytes(SHEET.as_bytes(), options).unwrap();
        let response = UploadResponse::from(report);
        assert_eq!(response.status, "warning");
    }

    #[test]
    fn test_error_response_shape() {
        let err = error_response("No file provided");
        assert_eq!(err["status"], "error");
        assert_eq!(err["error"], "No file provided");
    }
}
