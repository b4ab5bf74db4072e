//! Writing generated images to disk.

use crate::modules::generation::domain::{GeneratedImage, ImageData};
use crate::shared::errors::AppResult;
use crate::log_info;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Pause between files of a bulk export
pub const DEFAULT_EXPORT_DELAY: Duration = Duration::from_millis(300);

pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "png",
    }
}

/// Decode `image` and write it as `<dir>/<stem>.<ext>`
pub async fn export_image(image: &ImageData, dir: &Path, stem: &str) -> AppResult<PathBuf> {
    let bytes = image.decode()?;
    let path = dir.join(format!("{}.{}", stem, extension_for_mime(image.mime_type()?)));
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

/// Write named images one by one, sleeping `delay` between files
pub async fn export_named(
    files: &[(String, ImageData)],
    dir: &Path,
    delay: Duration,
) -> AppResult<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(files.len());
    for (index, (stem, image)) in files.iter().enumerate() {
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        written.push(export_image(image, dir, stem).await?);
    }
    log_info!("Exported {} images to {}", written.len(), dir.display());
    Ok(written)
}

pub async fn export_images(
    images: &[GeneratedImage],
    dir: &Path,
    delay: Duration,
) -> AppResult<Vec<PathBuf>> {
    let files: Vec<(String, ImageData)> = images
        .iter()
        .map(|image| (format!("scene-{}", image.id), image.image.clone()))
        .collect();
    export_named(&files, dir, delay).await
}
