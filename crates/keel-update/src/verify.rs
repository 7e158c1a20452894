//! SHA1 integrity check of the staged binary

use sha1::{Digest, Sha1};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{Result, UpdateError};

/// Lowercase hex SHA1 of a file, read fully into memory
pub fn file_sha1(path: &Path) -> Result<String> {
    let data = fs::read(path).map_err(|e| UpdateError::filesystem("read", path, e))?;
    Ok(sha1_hex(&data))
}

/// Lowercase hex SHA1 of a byte slice
pub fn sha1_hex(data: &[u8]) -> String {
    format!("{:x}", Sha1::digest(data))
}

/// Fail with an integrity error unless the file matches `expected`
pub fn verify_sha1(path: &Path, expected: &str) -> Result<()> {
    debug!("Calculating SHA1 checksum of {:?}", path);
    let actual = file_sha1(path)?;

    if expected.is_empty() || !actual.eq_ignore_ascii_case(expected) {
        return Err(UpdateError::Integrity {
            path: path.to_path_buf(),
            expected: expected.to_string(),
            actual,
        });
    }

    debug!("Checksum verified: {}", actual);
    Ok(())
}
