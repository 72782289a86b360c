//! Schema document loading and dialect detection
//!
//! Schema documents are plain JSON files. The dialect is auto-detected
//! from `$schema` (or forced through `CompilerConfig`); an absent or
//! unrecognized `$schema` maps to draft 2020-12.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::errors::SourceError;

/// A supported JSON-Schema dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// draft-07
    Draft7,
    /// draft 2019-09
    Draft201909,
    /// draft 2020-12 (the default)
    #[default]
    Draft202012,
}

impl Dialect {
    /// Detect the dialect of a schema document from its `$schema` URI.
    pub fn detect(document: &Value) -> Dialect {
        match document.get("$schema").and_then(Value::as_str) {
            Some(uri) if uri.contains("draft-07") => Dialect::Draft7,
            Some(uri) if uri.contains("2019-09") => Dialect::Draft201909,
            Some(uri) if uri.contains("2020-12") => Dialect::Draft202012,
            _ => Dialect::Draft202012,
        }
    }

    /// Canonical meta-schema URI
    pub fn uri(&self) -> &'static str {
        match self {
            Dialect::Draft7 => "http://json-schema.org/draft-07/schema#",
            Dialect::Draft201909 => "https://json-schema.org/draft/2019-09/schema",
            Dialect::Draft202012 => "https://json-schema.org/draft/2020-12/schema",
        }
    }
}

/// Loads schema documents from disk and keeps an in-memory registry.
pub struct SchemaSource {
    /// Directory containing schema documents
    dir: PathBuf,
    /// Loaded documents indexed by file stem
    documents: HashMap<String, Value>,
}

impl SchemaSource {
    /// Creates a source rooted at the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            documents: HashMap::new(),
        }
    }

    /// The source directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load every `.json` file in the source directory.
    pub fn load_all(&mut self) -> Result<(), SourceError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| SourceError::Io {
            path: self.dir.display().to_string(),
            reason: e.to_string(),
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| SourceError::Io {
                path: self.dir.display().to_string(),
                reason: e.to_string(),
            })?;
            let path = entry.path();
            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            let document = load_file(&path)?;
            let name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
                .unwrap_or_default();
            self.documents.insert(name, document);
        }

        Ok(())
    }

    /// Register a document directly (for tests or programmatic use).
    pub fn register(&mut self, name: impl Into<String>, document: Value) {
        self.documents.insert(name.into(), document);
    }

    /// Look up a loaded document by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.documents.get(name)
    }

    /// Number of loaded documents.
    pub fn count(&self) -> usize {
        self.documents.len()
    }
}

/// Load and validate one schema document from disk.
pub fn load_file(path: &Path) -> Result<Value, SourceError> {
    let content = fs::read_to_string(path).map_err(|e| SourceError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let document: Value = serde_json::from_str(&content).map_err(|e| SourceError::Parse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    if !document.is_object() && !document.is_boolean() {
        return Err(SourceError::InvalidDocument {
            path: path.display().to_string(),
            reason: "root must be an object or boolean schema".to_string(),
        });
    }

    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &str) {
        let mut file = fs::File::create(dir.join(name)).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_dialect_detection() {
        assert_eq!(
            Dialect::detect(&json!({"$schema": "http://json-schema.org/draft-07/schema#"})),
            Dialect::Draft7
        );
        assert_eq!(
            Dialect::detect(&json!({"$schema": "https://json-schema.org/draft/2019-09/schema"})),
            Dialect::Draft201909
        );
        assert_eq!(
            Dialect::detect(&json!({"$schema": "https://json-schema.org/draft/2020-12/schema"})),
            Dialect::Draft202012
        );
        // Absent or unrecognized defaults to 2020-12
        assert_eq!(Dialect::detect(&json!({})), Dialect::Draft202012);
        assert_eq!(
            Dialect::detect(&json!({"$schema": "urn:something-else"})),
            Dialect::Draft202012
        );
    }

    #[test]
    fn test_load_all() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "person.json", r#"{"type": "object"}"#);
        write_file(tmp.path(), "notes.txt", "not a schema");

        let mut source = SchemaSource::new(tmp.path());
        source.load_all().unwrap();

        assert_eq!(source.count(), 1);
        assert_eq!(source.get("person"), Some(&json!({"type": "object"})));
    }

    #[test]
    fn test_load_file_invalid_json() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "broken.json", "{not json");

        let err = load_file(&tmp.path().join("broken.json")).unwrap_err();
        assert!(matches!(err, SourceError::Parse { .. }));
    }

    #[test]
    fn test_load_file_non_schema_root() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "list.json", "[1, 2]");

        let err = load_file(&tmp.path().join("list.json")).unwrap_err();
        assert!(matches!(err, SourceError::InvalidDocument { .. }));
    }

    #[test]
    fn test_missing_directory() {
        let mut source = SchemaSource::new("/nonexistent/path");
        assert!(source.load_all().is_err());
    }
}
