//! # Document Loading
//!
//! External documents are fetched through a [`DocumentLoader`] the first time a
//! reference crosses into them. The resolver caches the result, so a loader is
//! called at most once per document URI. No network access is performed by the
//! loaders shipped here.

use crate::error::LoadError;
use serde_json::Value;
use std::fs;
use std::path::Path;
use url::Url;

/// Source of documents that were not registered up front.
pub trait DocumentLoader: Send + Sync {
    /// Loads the document identified by `uri` (never carries a fragment).
    fn load(&self, uri: &Url) -> Result<Value, LoadError>;
}

impl<F> DocumentLoader for F
where
    F: Fn(&Url) -> Result<Value, LoadError> + Send + Sync,
{
    fn load(&self, uri: &Url) -> Result<Value, LoadError> {
        self(uri)
    }
}

/// Loads `file://` URIs from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLoader;

impl DocumentLoader for FileLoader {
    fn load(&self, uri: &Url) -> Result<Value, LoadError> {
        if uri.scheme() != "file" {
            return Err(LoadError::UnsupportedUri(uri.to_string()));
        }
        let path = uri
            .to_file_path()
            .map_err(|_| LoadError::UnsupportedUri(uri.to_string()))?;
        tracing::debug!(path = %path.display(), "reading document from disk");
        let content = fs::read_to_string(&path)?;
        parse_document(&content, &path)
    }
}

/// Parses document text, choosing YAML for `.yaml` / `.yml` and JSON otherwise.
pub fn parse_document(content: &str, path: &Path) -> Result<Value, LoadError> {
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false);
    if is_yaml {
        Ok(serde_yaml::from_str(content)?)
    } else {
        Ok(serde_json::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_file_loader_reads_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("common.yaml");
        fs::write(&path, "User:\n  type: object\n").unwrap();

        let uri = Url::from_file_path(&path).unwrap();
        let doc = FileLoader.load(&uri).unwrap();
        assert_eq!(doc, json!({"User": {"type": "object"}}));
    }

    #[test]
    fn test_file_loader_reads_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("common.json");
        fs::write(&path, r#"{"User": {"type": "string"}}"#).unwrap();

        let uri = Url::from_file_path(&path).unwrap();
        let doc = FileLoader.load(&uri).unwrap();
        assert_eq!(doc["User"]["type"], "string");
    }

    #[test]
    fn test_file_loader_rejects_http() {
        let uri = Url::parse("https://example.com/schema.json").unwrap();
        let err = FileLoader.load(&uri).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedUri(_)));
    }

    #[test]
    fn test_file_loader_missing_file() {
        let dir = tempdir().unwrap();
        let uri = Url::from_file_path(dir.path().join("absent.json")).unwrap();
        assert!(matches!(FileLoader.load(&uri), Err(LoadError::Io(_))));
    }

    #[test]
    fn test_closure_loader() {
        let loader = |uri: &Url| -> Result<Value, LoadError> { Ok(json!({"uri": uri.as_str()})) };
        let uri = Url::parse("memory://docs/a.json").unwrap();
        assert_eq!(loader.load(&uri).unwrap()["uri"], "memory://docs/a.json");
    }
}
