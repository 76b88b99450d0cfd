//! Local-disk media store for uploaded images, addressed by public URL.

use std::io::Cursor;
use std::path::PathBuf;

use image::codecs::jpeg::JpegEncoder;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Longest allowed image edge; larger uploads are downscaled.
const MAX_IMAGE_EDGE: u32 = 1920;
/// JPEG quality for re-encoded uploads.
const JPEG_QUALITY: u8 = 80;

/// Stores uploads under `<root>/<folder>/<uuid>.<ext>` and serves them at
/// `<public_base_url>/<folder>/<uuid>.<ext>`.
pub struct MediaStorage {
    root: PathBuf,
    public_base_url: String,
    max_upload_bytes: usize,
}

impl MediaStorage {
    pub fn new(root: PathBuf, public_base_url: String, max_upload_bytes: usize) -> Self {
        Self {
            root,
            public_base_url,
            max_upload_bytes,
        }
    }

    /// Validates, downscales, and stores an uploaded image.
    ///
    /// The size limit is enforced before anything touches the filesystem:
    /// an over-limit payload performs no I/O at all. Images that decode are
    /// re-encoded as JPEG (downscaled to at most 1920px on the longest
    /// edge); an image that fails to decode is stored as received.
    ///
    /// # Returns
    ///
    /// The public URL of the stored file.
    pub async fn store(&self, data: Vec<u8>, folder: &str) -> Result<String> {
        if data.len() > self.max_upload_bytes {
            return Err(AppError::Validation(format!(
                "File too large. Max size is {}MB",
                self.max_upload_bytes / (1024 * 1024),
            )));
        }
        if data.is_empty() {
            return Err(AppError::Validation("Empty upload".to_string()));
        }
        validate_folder(folder)?;

        let kind = infer::get(&data)
            .ok_or_else(|| AppError::Validation("Unrecognized file type".to_string()))?;
        if !kind.mime_type().starts_with("image/") {
            return Err(AppError::Validation(
                "Only image uploads are allowed".to_string(),
            ));
        }

        let fallback_ext = kind.extension().to_string();
        let (bytes, ext) = tokio::task::spawn_blocking(move || prepare_image(data, fallback_ext))
            .await
            .map_err(|e| AppError::Internal(format!("Image task failed: {}", e)))?;

        let file_name = format!("{}.{}", Uuid::new_v4(), ext);
        let dir = self.root.join(folder);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&file_name), &bytes).await?;

        let url = format!("{}/{}/{}", self.public_base_url, folder, file_name);
        tracing::info!("✅ Stored media ({} bytes): {}", bytes.len(), url);
        Ok(url)
    }

    /// Deletes a stored file given its public URL.
    pub async fn delete_by_url(&self, url: &str) -> Result<()> {
        let relative = self.relative_path(url)?;
        tokio::fs::remove_file(self.root.join(&relative)).await?;
        tracing::info!("✅ Deleted media: {}", url);
        Ok(())
    }

    /// Maps a public URL back onto a path relative to the media root,
    /// rejecting anything outside the store.
    fn relative_path(&self, url: &str) -> Result<PathBuf> {
        let rest = url
            .strip_prefix(&self.public_base_url)
            .ok_or_else(|| AppError::Validation("URL outside the media store".to_string()))?
            .trim_start_matches('/');

        if rest.is_empty()
            || rest
                .split('/')
                .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(AppError::Validation("Invalid media URL".to_string()));
        }

        Ok(PathBuf::from(rest))
    }
}

fn validate_folder(folder: &str) -> Result<()> {
    let valid = !folder.is_empty()
        && folder.len() <= 64
        && folder
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AppError::Validation("Invalid upload folder".to_string()))
    }
}

/// Downscales and re-encodes a decodable image; anything else is stored as
/// received under its sniffed extension.
fn prepare_image(data: Vec<u8>, fallback_ext: String) -> (Vec<u8>, String) {
    let img = match image::load_from_memory(&data) {
        Ok(img) => img,
        Err(e) => {
            tracing::warn!("⚠️ Image decode failed, storing original: {}", e);
            return (data, fallback_ext);
        }
    };

    let img = if img.width().max(img.height()) > MAX_IMAGE_EDGE {
        img.thumbnail(MAX_IMAGE_EDGE, MAX_IMAGE_EDGE)
    } else {
        img
    };

    // JPEG has no alpha channel
    let rgb = image::DynamicImage::ImageRgb8(img.to_rgb8());
    let mut out = Cursor::new(Vec::new());
    match rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)) {
        Ok(()) => (out.into_inner(), "jpg".to_string()),
        Err(e) => {
            tracing::warn!("⚠️ Image re-encode failed, storing original: {}", e);
            (data, fallback_ext)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(max_upload_bytes: usize) -> (MediaStorage, PathBuf) {
        let root = std::env::temp_dir().join(format!("atrium-media-{}", Uuid::new_v4()));
        (
            MediaStorage::new(
                root.clone(),
                "http://127.0.0.1:3000".to_string(),
                max_upload_bytes,
            ),
            root,
        )
    }

    #[tokio::test]
    async fn oversize_upload_is_rejected_before_any_write() {
        let (storage, root) = storage(5 * 1024 * 1024);

        // a 10 MB payload against a 5 MB limit
        let result = storage.store(vec![0u8; 10 * 1024 * 1024], "articles").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(!root.exists(), "nothing may be written for a rejected upload");
    }

    #[tokio::test]
    async fn non_image_payload_is_rejected() {
        let (storage, root) = storage(1024 * 1024);

        let result = storage.store(b"%PDF-1.7 not an image".to_vec(), "articles").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(!root.exists());
    }

    #[test]
    fn public_url_maps_back_onto_the_store() {
        let (storage, _) = storage(1024);
        let path = storage
            .relative_path("http://127.0.0.1:3000/articles/abc.jpg")
            .unwrap();
        assert_eq!(path, PathBuf::from("articles/abc.jpg"));
    }

    #[test]
    fn foreign_and_traversal_urls_are_rejected() {
        let (storage, _) = storage(1024);
        assert!(storage
            .relative_path("https://elsewhere.example/articles/abc.jpg")
            .is_err());
        assert!(storage
            .relative_path("http://127.0.0.1:3000/../etc/passwd")
            .is_err());
        assert!(storage.relative_path("http://127.0.0.1:3000/").is_err());
    }

    #[test]
    fn folder_names_are_restricted() {
        assert!(validate_folder("articles").is_ok());
        assert!(validate_folder("avatars_2026").is_ok());
        assert!(validate_folder("a/b").is_err());
        assert!(validate_folder("..").is_err());
        assert!(validate_folder("").is_err());
    }
}
