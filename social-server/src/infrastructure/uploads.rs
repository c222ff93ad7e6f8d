use std::path::{Path, PathBuf};

use rand::RngExt;

use crate::domain::error::DomainError;

const ALLOWED_EXTENSIONS: [&str; 4] = ["jpeg", "jpg", "png", "gif"];

/// Writes uploaded images to a local directory and hands back the public
/// `/uploads/...` path stored on the entity. Files are never cleaned up if a
/// later step of the request fails.
#[derive(Debug, Clone)]
pub(crate) struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub(crate) fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub(crate) async fn ensure_dir(&self) -> Result<(), anyhow::Error> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    pub(crate) async fn save(
        &self,
        original_filename: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<String, DomainError> {
        let extension = allowed_extension(original_filename, content_type).ok_or(
            DomainError::Validation {
                field: "image",
                message: "only jpeg, jpg, png and gif images are accepted",
            },
        )?;

        let filename = format!(
            "{}-{:04}.{extension}",
            chrono::Utc::now().timestamp_millis(),
            rand::rng().random_range(0..10_000u32),
        );
        tokio::fs::write(self.dir.join(&filename), bytes)
            .await
            .map_err(|err| DomainError::Unexpected(format!("failed to store upload: {err}")))?;

        Ok(format!("/uploads/{filename}"))
    }
}

/// Returns the normalized extension when both the filename extension and the
/// declared content type pass the image whitelist.
fn allowed_extension(filename: &str, content_type: Option<&str>) -> Option<String> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())?
        .to_lowercase();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return None;
    }

    if let Some(content_type) = content_type {
        let subtype = content_type.strip_prefix("image/")?.to_lowercase();
        if !ALLOWED_EXTENSIONS.contains(&subtype.as_str()) {
            return None;
        }
    }

    Some(extension)
}

#[cfg(test)]
mod tests {
    use super::allowed_extension;

    #[test]
    fn whitelisted_images_pass() {
        assert_eq!(
            allowed_extension("photo.PNG", Some("image/png")).as_deref(),
            Some("png")
        );
        assert_eq!(allowed_extension("pic.jpg", None).as_deref(), Some("jpg"));
    }

    #[test]
    fn non_images_are_rejected() {
        assert!(allowed_extension("script.sh", Some("image/png")).is_none());
        assert!(allowed_extension("noextension", None).is_none());
        assert!(allowed_extension("photo.png", Some("text/html")).is_none());
        assert!(allowed_extension("photo.png", Some("image/svg+xml")).is_none());
    }
}
