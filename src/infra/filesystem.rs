//! Filesystem operations
//!
//! Thin wrappers over `std::fs` that attach the offending path to errors.

use sha2::{Digest, Sha256};
use std::path::Path;

use crate::error::FilesystemError;

/// Create a directory and all parent directories
pub fn create_dir_all(path: &Path) -> Result<(), FilesystemError> {
    std::fs::create_dir_all(path).map_err(|e| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Remove a directory and all its contents
pub fn remove_dir_all(path: &Path) -> Result<(), FilesystemError> {
    if path.exists() {
        std::fs::remove_dir_all(path).map_err(|e| FilesystemError::RemoveDir {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
    }
    Ok(())
}

/// Write content to a file, creating parent directories
pub fn write_file(path: &Path, content: impl AsRef<[u8]>) -> Result<(), FilesystemError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    std::fs::write(path, content).map_err(|e| FilesystemError::WriteFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Read raw bytes from a file
pub fn read_bytes(path: &Path) -> Result<Vec<u8>, FilesystemError> {
    std::fs::read(path).map_err(|e| FilesystemError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Read content from a file
pub fn read_file(path: &Path) -> Result<String, FilesystemError> {
    std::fs::read_to_string(path).map_err(|e| FilesystemError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Give `dest` the same permission bits as `src`
pub fn copy_permissions(src: &Path, dest: &Path) -> Result<(), FilesystemError> {
    let permissions = std::fs::metadata(src)
        .map_err(|e| FilesystemError::ReadFile {
            path: src.to_path_buf(),
            error: e.to_string(),
        })?
        .permissions();
    std::fs::set_permissions(dest, permissions).map_err(|e| FilesystemError::Permissions {
        path: dest.to_path_buf(),
        error: e.to_string(),
    })
}

/// Hex encoded SHA-256 of a file's contents
pub fn sha256_file(path: &Path) -> Result<String, FilesystemError> {
    let bytes = read_bytes(path)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}
