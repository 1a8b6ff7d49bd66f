//! Uploaded screenshot library.
//!
//! An ordered list of image data URIs persisted as JSON. The list is small
//! by construction: at most [`MAX_ASSETS`] entries of at most
//! [`MAX_ASSET_BYTES`] each.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EditorError, EditorResult};

/// Maximum number of stored images.
pub const MAX_ASSETS: usize = 5;

/// Maximum decoded size of one image.
pub const MAX_ASSET_BYTES: usize = 5 * 1024 * 1024;

/// Key the list is stored under.
pub const STORAGE_KEY: &str = "storedImages";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Stored {
    #[serde(rename = "storedImages", default)]
    images: Vec<String>,
}

/// Persistent list of uploaded images.
#[derive(Debug, Clone)]
pub struct AssetLibrary {
    path: PathBuf,
    images: Vec<String>,
}

impl AssetLibrary {
    /// Load the library stored at `path`.
    ///
    /// A missing file is an empty library. So is an unreadable or corrupt
    /// one; the problem is logged and the file is overwritten on the next
    /// change.
    #[must_use]
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let images = match std::fs::read_to_string(&path) {
            Ok(json) => match serde_json::from_str::<Stored>(&json) {
                Ok(stored) => stored.images,
                Err(e) => {
                    tracing::warn!("Failed to parse stored images in {}: {e}", path.display());
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read stored images from {}: {e}", path.display());
                Vec::new()
            }
        };
        tracing::debug!("Loaded {} stored images", images.len());
        Self { path, images }
    }

    /// Storage file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored data URIs, oldest first.
    #[must_use]
    pub fn images(&self) -> &[String] {
        &self.images
    }

    /// Number of stored images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether the library is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Append an image data URI and persist. Returns its index.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::AssetTooLarge`],
    /// [`EditorError::AssetLibraryFull`] or [`EditorError::NotAnImage`]
    /// (checked in that order), or an I/O error if saving fails. The list is
    /// unchanged on every error.
    pub fn add(&mut self, data_uri: &str) -> EditorResult<usize> {
        let size = decoded_len(data_uri);
        if size > MAX_ASSET_BYTES {
            return Err(EditorError::AssetTooLarge {
                size,
                limit: MAX_ASSET_BYTES,
            });
        }
        if self.images.len() >= MAX_ASSETS {
            return Err(EditorError::AssetLibraryFull { limit: MAX_ASSETS });
        }
        if !is_image_data_uri(data_uri) {
            let prefix: String = data_uri.chars().take(32).collect();
            return Err(EditorError::NotAnImage(prefix));
        }
        let mut images = self.images.clone();
        images.push(data_uri.to_string());
        self.save(&images)?;
        self.images = images;
        Ok(self.images.len() - 1)
    }

    /// Remove the image at `index` and persist. Returns `None` for an
    /// out-of-range index.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if saving fails. The list is then unchanged.
    pub fn remove(&mut self, index: usize) -> EditorResult<Option<String>> {
        if index >= self.images.len() {
            return Ok(None);
        }
        let mut images = self.images.clone();
        let removed = images.remove(index);
        self.save(&images)?;
        self.images = images;
        Ok(Some(removed))
    }

    /// Write `images` to the storage file. The in-memory list is only
    /// replaced once this succeeds.
    fn save(&self, images: &[String]) -> EditorResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let stored = Stored {
            images: images.to_vec(),
        };
        std::fs::write(&self.path, serde_json::to_string(&stored)?)?;
        Ok(())
    }
}

/// Whether `uri` is a `data:image/...` URI.
#[must_use]
pub fn is_image_data_uri(uri: &str) -> bool {
    uri.strip_prefix("data:")
        .is_some_and(|rest| rest.starts_with("image/") && rest.contains(','))
}

/// Decoded payload size of a data URI, in bytes.
#[must_use]
pub fn decoded_len(uri: &str) -> usize {
    let Some((header, payload)) = uri.split_once(',') else {
        return uri.len();
    };
    if header.ends_with(";base64") {
        let trimmed = payload.trim_end_matches('=');
        trimmed.len() * 3 / 4
    } else {
        payload.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PNG: &str = "data:image/png;base64,iVBORw0KGgo=";

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().expect("tempdir");
        let library = AssetLibrary::load(dir.path().join("assets.json"));
        assert!(library.is_empty());
    }

    #[test]
    fn test_add_persists_in_order() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("nested").join("assets.json");
        let mut library = AssetLibrary::load(&path);
        assert_eq!(library.add(PNG).expect("add"), 0);
        assert_eq!(library.add("data:image/jpeg;base64,/9j/").expect("add"), 1);

        let reloaded = AssetLibrary::load(&path);
        assert_eq!(reloaded.images(), library.images());
        let raw = std::fs::read_to_string(&path).expect("read");
        assert!(raw.contains(STORAGE_KEY));
    }

    #[test]
    fn test_capacity_and_type_limits() {
        let dir = TempDir::new().expect("tempdir");
        let mut library = AssetLibrary::load(dir.path().join("assets.json"));
        assert!(matches!(
            library.add("data:text/plain;base64,aGk="),
            Err(EditorError::NotAnImage(_))
        ));
        for _ in 0..MAX_ASSETS {
            library.add(PNG).expect("add");
        }
        let err = library.add(PNG).expect_err("full");
        assert_eq!(err.to_string(), "Can only upload 5 images!");
    }

    #[test]
    fn test_size_limit_checked_first() {
        let dir = TempDir::new().expect("tempdir");
        let mut library = AssetLibrary::load(dir.path().join("assets.json"));
        let big = format!("data:text/plain;base64,{}", "A".repeat(MAX_ASSET_BYTES / 3 * 4 + 8));
        assert!(matches!(
            library.add(&big),
            Err(EditorError::AssetTooLarge { .. })
        ));
    }

    #[test]
    fn test_remove_by_index() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("assets.json");
        let mut library = AssetLibrary::load(&path);
        library.add(PNG).expect("add");
        library.add("data:image/gif;base64,R0lGOD").expect("add");
        assert_eq!(library.remove(5).expect("remove"), None);
        assert_eq!(library.remove(0).expect("remove").as_deref(), Some(PNG));
        assert_eq!(AssetLibrary::load(&path).len(), 1);
    }

    #[test]
    fn test_failed_save_keeps_list() {
        let dir = TempDir::new().expect("tempdir");
        let mut library = AssetLibrary::load(dir.path());
        assert!(library.is_empty());
        assert!(matches!(library.add(PNG), Err(EditorError::Io(_))));
        assert!(library.is_empty());
    }

    #[test]
    fn test_failed_remove_keeps_list() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("assets.json");
        let mut library = AssetLibrary::load(&path);
        library.add(PNG).expect("add");
        std::fs::remove_file(&path).expect("remove file");
        std::fs::create_dir(&path).expect("block path");

        assert!(library.remove(0).is_err());
        assert_eq!(library.images(), [PNG.to_string()]);
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("assets.json");
        std::fs::write(&path, "{not json").expect("write");
        let library = AssetLibrary::load(&path);
        assert!(library.is_empty());
    }

    #[test]
    fn test_decoded_len() {
        assert_eq!(decoded_len("data:image/png;base64,AAAA"), 3);
        assert_eq!(decoded_len("data:image/svg+xml,<svg/>"), 6);
    }
}
