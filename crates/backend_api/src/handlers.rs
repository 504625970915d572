use axum::{
    extract::{Multipart, State},
    response::{Html, IntoResponse, Redirect},
    Json,
};
use chrono::Local;
use document_store::with_retry;
use models::Period;

use crate::error::{ApiError, Result};
use crate::state::SharedState;

const INDEX_HTML: &str = include_str!("../templates/index.html");
const STATUS_HTML: &str = include_str!("../templates/status.html");

/// GET / — the upload form.
pub async fn upload_form() -> impl IntoResponse {
    Html(INDEX_HTML)
}

/// GET /status — the page that tails the consolidation run log.
pub async fn status_page() -> impl IntoResponse {
    Html(STATUS_HTML)
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "bank-statement-uploader"
    }))
}

/// POST / — multipart upload into the Year/Month/Company/Bank hierarchy,
/// then redirect to the status page which starts a consolidation run.
///
/// The form posts parallel `company[]`/`bank[]` rows; each row's files
/// arrive under `files<row index>`.
pub async fn upload_files(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Redirect> {
    let mut companies: Vec<String> = Vec::new();
    let mut banks: Vec<String> = Vec::new();
    let mut files: Vec<(usize, String, Vec<u8>)> = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "company[]" => companies.push(field.text().await?.trim().to_string()),
            "bank[]" => banks.push(field.text().await?.trim().to_string()),
            other => {
                if let Some(row) = file_field_index(other) {
                    let file_name = sanitize_filename(field.file_name().unwrap_or_default());
                    let bytes = field.bytes().await?;
                    if file_name.is_empty() || bytes.is_empty() {
                        continue;
                    }
                    files.push((row, file_name, bytes.to_vec()));
                }
            }
        }
    }

    if companies.is_empty()
        || banks.is_empty()
        || companies.len() != banks.len()
        || companies.iter().any(|c| c.is_empty())
        || banks.iter().any(|b| b.is_empty())
    {
        return Err(ApiError::MissingCompanyOrBank);
    }
    if files.is_empty() {
        return Err(ApiError::InvalidUpload("no files selected".to_string()));
    }

    let period = Period::from_date(Local::now().date_naive());
    let stored = tokio::task::spawn_blocking(move || -> anyhow::Result<usize> {
        store_uploads(&state, period, &companies, &banks, files)
    })
    .await
    .map_err(|err| ApiError::Internal(err.to_string()))??;

    tracing::info!(count = stored, "upload complete, handing off to the run log");
    Ok(Redirect::to("/status"))
}

/// Blocking half of the upload: folder resolution and file writes against
/// the (synchronous) document store.
fn store_uploads(
    state: &SharedState,
    period: Period,
    companies: &[String],
    banks: &[String],
    files: Vec<(usize, String, Vec<u8>)>,
) -> anyhow::Result<usize> {
    let store = state.store.as_ref();
    let retry = &state.retry;

    let year_id = with_retry(retry, || {
        store.ensure_folder(&state.root_folder_id, &period.year_segment())
    })?;
    let month_id = with_retry(retry, || {
        store.ensure_folder(&year_id, &period.month_segment())
    })?;

    let mut stored = 0usize;
    for (row, file_name, bytes) in files {
        let (company, bank) = companies
            .get(row)
            .zip(banks.get(row))
            .ok_or_else(|| anyhow::anyhow!("file field references unknown form row {}", row))?;

        let company_id = with_retry(retry, || store.ensure_folder(&month_id, company))?;
        let bank_id = with_retry(retry, || store.ensure_folder(&company_id, bank))?;
        with_retry(retry, || store.upload_file(&bank_id, &file_name, &bytes))?;

        tracing::info!(file = %file_name, company = %company, bank = %bank, "stored upload");
        stored += 1;
    }
    Ok(stored)
}

/// Row index of a `files<N>` form field.
fn file_field_index(field_name: &str) -> Option<usize> {
    field_name.strip_prefix("files")?.parse().ok()
}

/// Keep only the final path component and drop characters that are unsafe
/// as a store entry name. Unicode (e.g. Thai) file names pass through.
fn sanitize_filename(raw: &str) -> String {
    let base = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control() && !matches!(c, '<' | '>' | ':' | '"' | '|' | '?' | '*'))
        .collect();
    cleaned.trim_matches([' ', '.']).to_string()
}
