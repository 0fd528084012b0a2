use crate::error::{AppError, AppResult};
use crate::models::new_id;
use std::path::Path;

/// Public path prefix photos are served under.
pub const UPLOADS_ROUTE: &str = "/uploads";

/// Image extensions accepted for recipe photos.
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "avif"];

/// Stores uploaded recipe photos on the local filesystem.
pub struct PhotoService;

impl PhotoService {
    /// Write `bytes` under a fresh random name in `dir`, keeping the original extension.
    ///
    /// # Returns
    ///
    /// The relative URL the photo is served from, e.g. `/uploads/<uuid>.jpg`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidUpload` for an empty file or a non-image extension.
    pub async fn save(dir: &Path, original_name: Option<&str>, bytes: &[u8]) -> AppResult<String> {
        if bytes.is_empty() {
            return Err(AppError::InvalidUpload("Photo is empty".to_string()));
        }

        let extension = original_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let file_name = match extension {
            Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => {
                format!("{}.{}", new_id(), ext)
            }
            Some(ext) => {
                return Err(AppError::InvalidUpload(format!(
                    "Unsupported photo type: .{}",
                    ext
                )))
            }
            None => new_id(),
        };

        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(dir.join(&file_name), bytes).await?;

        tracing::debug!(file = %file_name, size = bytes.len(), "Stored recipe photo");
        Ok(format!("{}/{}", UPLOADS_ROUTE, file_name))
    }

    /// Best-effort removal of a photo previously stored by [`PhotoService::save`].
    ///
    /// URLs outside `/uploads/`, such as externally hosted photos, are left alone.
    /// Failures are logged rather than returned.
    pub async fn remove(dir: &Path, photo_url: &str) {
        let Some(file_name) = local_file_name(photo_url) else {
            return;
        };

        match tokio::fs::remove_file(dir.join(file_name)).await {
            Ok(()) => tracing::debug!(file = %file_name, "Removed recipe photo"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(file = %file_name, "Failed to remove recipe photo: {}", e),
        }
    }
}

/// File name behind a local photo URL; `None` unless it is a single plain path segment.
fn local_file_name(photo_url: &str) -> Option<&str> {
    let name = photo_url
        .strip_prefix(UPLOADS_ROUTE)?
        .strip_prefix('/')?;

    let plain = !name.is_empty() && !name.starts_with('.') && !name.contains(['/', '\\']);
    plain.then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_keeps_extension() {
        let dir = tempfile::tempdir().unwrap();

        let url = PhotoService::save(dir.path(), Some("Cake.JPG"), b"img").await.unwrap();
        assert!(url.starts_with("/uploads/"));
        assert!(url.ends_with(".jpg"));

        let name = url.trim_start_matches("/uploads/");
        assert_eq!(std::fs::read(dir.path().join(name)).unwrap(), b"img");
    }

    #[tokio::test]
    async fn test_save_rejects_empty_and_non_images() {
        let dir = tempfile::tempdir().unwrap();

        assert!(PhotoService::save(dir.path(), Some("a.png"), b"").await.is_err());
        let err = PhotoService::save(dir.path(), Some("run.sh"), b"#!").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidUpload(_)));
    }

    #[tokio::test]
    async fn test_remove_deletes_stored_photo() {
        let dir = tempfile::tempdir().unwrap();
        let url = PhotoService::save(dir.path(), Some("a.png"), b"img").await.unwrap();
        let name = url.trim_start_matches("/uploads/").to_string();

        PhotoService::remove(dir.path(), &url).await;
        assert!(!dir.path().join(&name).exists());

        // Already gone
        PhotoService::remove(dir.path(), &url).await;
    }

    #[tokio::test]
    async fn test_remove_ignores_foreign_urls() {
        let dir = tempfile::tempdir().unwrap();
        let outside = dir.path().join("keep.png");
        std::fs::write(&outside, b"img").unwrap();
        let nested = dir.path().join("uploads");
        std::fs::create_dir(&nested).unwrap();

        PhotoService::remove(&nested, "https://cdn.test/uploads/keep.png").await;
        PhotoService::remove(&nested, "/uploads/../keep.png").await;
        PhotoService::remove(&nested, "keep.png").await;

        assert!(outside.exists());
    }

    #[test]
    fn test_local_file_name() {
        assert_eq!(local_file_name("/uploads/abc.png"), Some("abc.png"));
        assert_eq!(local_file_name("/uploads/"), None);
        assert_eq!(local_file_name("/uploads/a/b.png"), None);
        assert_eq!(local_file_name("/uploads/..\\x.png"), None);
        assert_eq!(local_file_name("/uploadsabc.png"), None);
        assert_eq!(local_file_name("https://cdn.test/x.png"), None);
    }
}
