// src/utils/upload.rs

use std::path::PathBuf;

use uuid::Uuid;

use crate::error::AppError;

/// Image content types accepted for profile pictures.
const ALLOWED_IMAGE_TYPES: [(&str, &str); 4] = [
    ("image/jpeg", "jpg"),
    ("image/jpg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
];

/// File-storage collaborator for uploaded images.
///
/// Writes under the configured upload root, which is served statically at
/// `/uploads`. File writes happen outside any database transaction, so a
/// crash between write and commit can leave an orphaned file.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(upload_dir: &str) -> Self {
        Self {
            root: PathBuf::from(upload_dir),
        }
    }

    /// Maps an accepted image content type to a file extension.
    pub fn extension_for(content_type: &str) -> Option<&'static str> {
        ALLOWED_IMAGE_TYPES
            .iter()
            .find(|(ct, _)| *ct == content_type)
            .map(|(_, ext)| *ext)
    }

    /// Stores a profile picture under a generated unique filename.
    ///
    /// Returns the public path (e.g. "/uploads/profile_pics/<uuid>.png")
    /// to persist on the user record.
    pub async fn save_profile_pic(
        &self,
        content_type: &str,
        data: &[u8],
    ) -> Result<String, AppError> {
        let ext = Self::extension_for(content_type).ok_or_else(|| {
            AppError::BadRequest("Only JPEG, PNG, and WebP images are allowed".to_string())
        })?;

        let dir = self.root.join("profile_pics");
        tokio::fs::create_dir_all(&dir).await?;

        let filename = format!("{}.{}", Uuid::new_v4(), ext);
        tokio::fs::write(dir.join(&filename), data).await?;

        Ok(format!("/uploads/profile_pics/{}", filename))
    }

    /// Best-effort removal of a previously stored file by its public path.
    pub async fn delete_public_path(&self, public_path: &str) {
        let Some(relative) = public_path.strip_prefix("/uploads/") else {
            return;
        };
        let path = self.root.join(relative);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!("Failed to remove old upload {:?}: {}", path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_supported_image_types() {
        assert_eq!(UploadStore::extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(UploadStore::extension_for("image/png"), Some("png"));
        assert_eq!(UploadStore::extension_for("image/webp"), Some("webp"));
    }

    #[test]
    fn rejects_other_content_types() {
        assert_eq!(UploadStore::extension_for("image/gif"), None);
        assert_eq!(UploadStore::extension_for("application/pdf"), None);
    }
}
