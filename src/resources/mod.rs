//! Loading shader sources and images from disk.
//!
//! Paths arrive already resolved against the configured asset directory.

use std::path::Path;

use crate::error::{EngineError, Result};

pub mod texture;

pub fn load_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| EngineError::not_found(path, e))
}

pub fn load_binary(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| EngineError::not_found(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reports_its_path() {
        let path = std::env::temp_dir().join("quad-ngin-does-not-exist.wgsl");
        let err = load_string(&path).unwrap_err();
        match err {
            EngineError::ResourceNotFound { path: reported, source } => {
                assert_eq!(reported, path);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn reads_bytes_and_text() {
        let path = std::env::temp_dir().join(format!("quad-ngin-{}.txt", std::process::id()));
        std::fs::write(&path, "fn vs_main() {}").unwrap();
        assert_eq!(load_string(&path).unwrap(), "fn vs_main() {}");
        assert_eq!(load_binary(&path).unwrap().len(), 15);
        std::fs::remove_file(&path).unwrap();
    }
}
