//! Naming and validation rules for uploaded image assets.
//!
//! Stored files never keep the client-supplied name. Each upload gets a
//! content-addressed name: the SHA-256 of the bytes, the upload time and a
//! random nonce, followed by the original (lowercased) extension.

use std::fmt;

use rand::Rng;
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// Image extensions accepted for avatars and banners (lowercase, no dot).
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Namespace an asset is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetCategory {
    /// User avatars.
    Users,
    /// Product banners.
    Products,
}

impl AssetCategory {
    pub const ALL: [AssetCategory; 2] = [AssetCategory::Users, AssetCategory::Products];

    /// Directory name below the upload root.
    pub fn dir_name(self) -> &'static str {
        match self {
            AssetCategory::Users => "users",
            AssetCategory::Products => "products",
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Lowercased extension of `filename` (text after the last `.`), if any.
pub fn extension_of(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Whether `filename` ends in one of [`ALLOWED_IMAGE_EXTENSIONS`].
///
/// Only the suffix of the client-supplied name is inspected; the content is
/// not sniffed.
pub fn validate_extension(filename: &str) -> bool {
    extension_of(filename).is_some_and(|ext| ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Generate a fresh stored name for an upload.
///
/// Fails with [`CoreError::UnsupportedMediaType`] when the extension is not
/// allowed, so callers that skip [`validate_extension`] still cannot store a
/// disallowed file.
pub fn generate_name(filename: &str, content: &[u8]) -> Result<String, CoreError> {
    let ext = extension_of(filename)
        .filter(|ext| ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(unsupported_extension)?;

    let nanos = chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default();
    let mut nonce = [0u8; 16];
    rand::rng().fill(&mut nonce[..]);

    let mut hasher = Sha256::new();
    hasher.update(content);
    hasher.update(nanos.to_le_bytes());
    hasher.update(nonce);

    Ok(format!("{:x}.{ext}", hasher.finalize()))
}

/// Whether a stored name can be joined onto a category directory safely.
///
/// Rejects empty names, path separators, parent references and dotfiles.
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && !name.contains("..")
}

/// The error returned for any upload whose extension is not allowed.
pub fn unsupported_extension() -> CoreError {
    CoreError::UnsupportedMediaType("Type file invalid. Only select (.jpg, .jpeg, .png)".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn accepts_allowed_extensions_case_insensitively() {
        assert!(validate_extension("avatar.png"));
        assert!(validate_extension("avatar.JPG"));
        assert!(validate_extension("holiday.photo.Jpeg"));
    }

    #[test]
    fn rejects_other_or_missing_extensions() {
        assert!(!validate_extension("anim.gif"));
        assert!(!validate_extension("png"));
        assert!(!validate_extension("archive.png.zip"));
        assert!(!validate_extension("trailing."));
        assert!(!validate_extension(""));
    }

    #[test]
    fn generated_name_keeps_lowercased_extension() {
        let name = generate_name("Photo.PNG", b"bytes").unwrap();
        let (stem, ext) = name.rsplit_once('.').unwrap();
        assert_eq!(ext, "png");
        assert_eq!(stem.len(), 64);
        assert!(stem.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generated_names_differ_for_different_content() {
        let a = generate_name("a.png", b"first image").unwrap();
        let b = generate_name("a.png", b"second image").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn generated_names_differ_for_identical_content() {
        let names: std::collections::HashSet<_> = (0..50)
            .map(|_| generate_name("same.jpg", b"same").unwrap())
            .collect();
        assert_eq!(names.len(), 50);
    }

    #[test]
    fn generate_name_rejects_gif() {
        assert_matches!(
            generate_name("anim.gif", b"GIF89a"),
            Err(CoreError::UnsupportedMediaType(_))
        );
    }

    #[test]
    fn safe_names() {
        assert!(is_safe_name("abc123.png"));
        assert!(!is_safe_name(""));
        assert!(!is_safe_name("../etc/passwd"));
        assert!(!is_safe_name("nested/file.png"));
        assert!(!is_safe_name("nested\\file.png"));
        assert!(!is_safe_name(".hidden.png"));
    }

    #[test]
    fn category_directories() {
        assert_eq!(AssetCategory::Users.dir_name(), "users");
        assert_eq!(AssetCategory::Products.to_string(), "products");
    }
}
