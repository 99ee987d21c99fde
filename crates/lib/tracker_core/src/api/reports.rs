//! Trainer-only aggregate report.

use tokio_util::sync::CancellationToken;

use super::ApiError;
use crate::models::Report;
use crate::transport::{ApiClient, ApiRequest};

pub const REPORTS_PATH: &str = "reports/";

/// `GET /reports/`. The server rejects trainees with 403.
pub async fn fetch(client: &ApiClient, cancel: &CancellationToken) -> Result<Report, ApiError> {
    Ok(client.fetch(&ApiRequest::get(REPORTS_PATH), cancel).await?)
}
