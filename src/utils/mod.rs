// Utilities Module
//
// File helpers, content hashing and Unix-style path handling shared by the
// extractor manager, the linker and the analyzer.

use anyhow::Result;
use std::path::Path;

/// File utilities
pub mod file_utils {
    use super::*;
    use std::fs;

    /// Check if a file has a TypeScript or JavaScript extension
    pub fn is_supported_file(path: &Path) -> bool {
        crate::language::Dialect::from_path(path).is_some()
    }

    /// Read file content safely
    pub fn read_file_content(path: &Path) -> Result<String> {
        Ok(fs::read_to_string(path)?)
    }
}

/// Path conversion utilities (absolute ↔ relative Unix-style)
pub mod paths;

/// Blake3 hex digest of a file's content
pub fn hash_content(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}
