//! Loading the fetcher's product document.
//!
//! The input is a JSON array of product rows. The raw bytes are hashed with
//! BLAKE3 so a run manifest can identify exactly which document it processed.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::product::ProductHistory;

/// Errors from the loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse products in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Products read from disk, with provenance.
#[derive(Debug)]
pub struct LoadedProducts {
    pub products: Vec<ProductHistory>,
    /// BLAKE3 hash of the input document.
    pub input_hash: String,
}

/// Read and parse a product document.
pub fn load_products(path: &Path) -> Result<LoadedProducts, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let products = parse_products(&bytes).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let input_hash = blake3::hash(&bytes).to_hex().to_string();

    let pending = products.iter().filter(|p| p.is_pending()).count();
    info!(
        path = %path.display(),
        products = products.len(),
        pending,
        "loaded product histories"
    );

    Ok(LoadedProducts {
        products,
        input_hash,
    })
}

/// Parse a JSON array of product rows.
pub fn parse_products(json: &[u8]) -> Result<Vec<ProductHistory>, serde_json::Error> {
    serde_json::from_slice(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DOC: &str = r#"[
        {"appid": 10, "name": "A", "review_start": 1285891200, "time_series": []},
        {"appid": 20, "name": "B", "review_start": 0, "time_series": "Unknown"}
    ]"#;

    #[test]
    fn loads_products_and_hashes_input() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DOC.as_bytes()).unwrap();

        let loaded = load_products(file.path()).unwrap();
        assert_eq!(loaded.products.len(), 2);
        assert!(loaded.products[1].is_pending());
        assert_eq!(loaded.input_hash, blake3::hash(DOC.as_bytes()).to_hex().to_string());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_products(Path::new("/nonexistent/time_data.json")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn bad_json_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{\"not\": \"an array\"}").unwrap();
        let err = load_products(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }
}
