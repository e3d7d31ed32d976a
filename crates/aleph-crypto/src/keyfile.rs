//! Key persistence for the field cipher.
//!
//! The master key lives in a single file with owner-only permissions. Hosts
//! with a real key-management facility should construct the cipher from
//! their own key material instead.

use std::fs;
use std::io::Write;
use std::path::Path;

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

use crate::cipher::FieldCipher;
use crate::Result;

/// Load the cipher key from `path`, generating and persisting a fresh one
/// if the file does not exist yet.
pub fn load_or_generate(path: &Path) -> Result<FieldCipher> {
    if path.exists() {
        let bytes = fs::read(path)?;
        return FieldCipher::from_bytes(&bytes);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let cipher = FieldCipher::generate();

    // Owner-only from the moment the file exists.
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);
    let mut file = options.open(path)?;
    file.write_all(cipher.key_bytes())?;

    Ok(cipher)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_then_reloads_same_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("field.key");

        let first = load_or_generate(&path).unwrap();
        let armored = first.encrypt_field("secret").unwrap();

        let second = load_or_generate(&path).unwrap();
        assert_eq!(second.decrypt_field(&armored).unwrap(), "secret");
    }

    #[cfg(unix)]
    #[test]
    fn key_file_is_owner_only() {
        use std::os::unix::fs::MetadataExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("field.key");

        load_or_generate(&path).unwrap();

        let mode = fs::metadata(&path).unwrap().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("field.key");

        load_or_generate(&path).unwrap();
        assert!(path.exists());
    }
}
