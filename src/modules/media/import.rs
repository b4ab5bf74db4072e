//! File to `ImageData` conversion for uploads.

use crate::modules::generation::domain::ImageData;
use crate::shared::errors::{AppError, AppResult};
use crate::{log_info, log_warn};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize)]
pub struct ImportFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Files that converted, in input order, and the ones that did not
#[derive(Debug, Default, Clone, Serialize)]
pub struct ImportReport {
    pub images: Vec<ImageData>,
    pub failures: Vec<ImportFailure>,
}

impl ImportReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub fn mime_for_path(path: &Path) -> AppResult<&'static str> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => Ok("image/png"),
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "webp" => Ok("image/webp"),
        "gif" => Ok("image/gif"),
        "heic" => Ok("image/heic"),
        _ => Err(AppError::ValidationError(format!(
            "Unsupported image type: {}",
            path.display()
        ))),
    }
}

pub async fn import_file(path: &Path) -> AppResult<ImageData> {
    let mime = mime_for_path(path)?;
    let bytes = tokio::fs::read(path).await?;
    if bytes.is_empty() {
        return Err(AppError::ValidationError(format!(
            "{} is empty",
            path.display()
        )));
    }
    Ok(ImageData::from_bytes(mime, &bytes))
}

/// Convert every file; one bad file does not stop the rest
pub async fn import_files<P: AsRef<Path>>(paths: &[P]) -> ImportReport {
    let mut report = ImportReport::default();
    for path in paths {
        let path = path.as_ref();
        match import_file(path).await {
            Ok(image) => report.images.push(image),
            Err(e) => {
                log_warn!("Skipping {}: {}", path.display(), e);
                report.failures.push(ImportFailure {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
            }
        }
    }
    log_info!(
        "Imported {} images ({} failed)",
        report.images.len(),
        report.failures.len()
    );
    report
}
