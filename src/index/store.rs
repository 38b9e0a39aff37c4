//! Index persistence
//!
//! One pretty-printed JSON file per document. The canonical path is
//! `{dir}/{document_id}.json`; the loader also accepts the legacy
//! `index-{document_id}.json` naming so older index sets keep working.

use crate::errors::Result;
use crate::index::types::DocumentIndex;
use std::fs;
use std::path::{Path, PathBuf};

/// Filesystem store for document indices
#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    /// Create a store rooted at `dir` (the directory may not exist yet)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Canonical path for a document's index file
    pub fn index_path(&self, document_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", document_id))
    }

    fn legacy_path(&self, document_id: &str) -> PathBuf {
        self.dir.join(format!("index-{}.json", document_id))
    }

    /// Check whether an index exists under either naming
    pub fn exists(&self, document_id: &str) -> bool {
        self.index_path(document_id).is_file() || self.legacy_path(document_id).is_file()
    }

    /// True when the directory is missing or holds no index files
    pub fn is_empty(&self) -> bool {
        match fs::read_dir(&self.dir) {
            Ok(entries) => !entries
                .flatten()
                .any(|e| e.path().extension().map(|x| x == "json").unwrap_or(false)),
            Err(_) => true,
        }
    }

    /// Persist an index, fully overwriting any previous file
    pub fn save(&self, index: &DocumentIndex) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let path = self.index_path(&index.document_id);
        let json = serde_json::to_string_pretty(index)?;
        fs::write(&path, json)?;

        Ok(path)
    }

    /// Load one index by document id
    pub fn load(&self, document_id: &str) -> Result<DocumentIndex> {
        let path = if self.index_path(document_id).is_file() {
            self.index_path(document_id)
        } else {
            self.legacy_path(document_id)
        };

        let json = fs::read_to_string(path)?;
        let index = serde_json::from_str(&json)?;
        Ok(index)
    }

    /// Load every readable index in the directory.
    ///
    /// Unparseable files are skipped: one corrupt index must not take down
    /// retrieval over the rest of the corpus.
    pub fn load_all(&self) -> Vec<DocumentIndex> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        let mut indices = Vec::new();
        let mut paths: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().map(|x| x == "json").unwrap_or(false))
            .collect();
        paths.sort();

        for path in paths {
            let Ok(json) = fs::read_to_string(&path) else {
                continue;
            };
            match serde_json::from_str::<DocumentIndex>(&json) {
                Ok(index) => indices.push(index),
                Err(_) => continue,
            }
        }

        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::types::{IndexMetadata, PageRange, Section};
    use tempfile::TempDir;

    fn sample_index(id: &str) -> DocumentIndex {
        DocumentIndex {
            document_id: id.to_string(),
            title: "Sample".to_string(),
            category: "general".to_string(),
            source_file: "sample.txt".to_string(),
            total_pages: 5,
            summary: "A sample index".to_string(),
            metadata: IndexMetadata {
                code: id.to_string(),
                version: "1.0".to_string(),
                date: "2024-01-01".to_string(),
                indexed_at: "2024-01-01T00:00:00Z".to_string(),
            },
            sections: vec![Section {
                section_id: "1".to_string(),
                title: "Section 1".to_string(),
                page_range: PageRange::new(1, 5),
                summary: "all of it".to_string(),
                keywords: vec!["sample".to_string()],
            }],
        }
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = IndexStore::new(tmp.path());

        let index = sample_index("PROC-RET-001");
        let path = store.save(&index).unwrap();
        assert!(path.ends_with("PROC-RET-001.json"));

        let loaded = store.load("PROC-RET-001").unwrap();
        assert_eq!(loaded.document_id, "PROC-RET-001");
        assert_eq!(loaded.sections.len(), 1);
    }

    #[test]
    fn test_legacy_naming_accepted() {
        let tmp = TempDir::new().unwrap();
        let store = IndexStore::new(tmp.path());

        let index = sample_index("PROC-TRA-003");
        let json = serde_json::to_string_pretty(&index).unwrap();
        std::fs::write(tmp.path().join("index-PROC-TRA-003.json"), json).unwrap();

        assert!(store.exists("PROC-TRA-003"));
        let loaded = store.load("PROC-TRA-003").unwrap();
        assert_eq!(loaded.document_id, "PROC-TRA-003");
    }

    #[test]
    fn test_load_all_skips_corrupt() {
        let tmp = TempDir::new().unwrap();
        let store = IndexStore::new(tmp.path());

        store.save(&sample_index("A")).unwrap();
        store.save(&sample_index("B")).unwrap();
        std::fs::write(tmp.path().join("corrupt.json"), "{ not json").unwrap();

        let all = store.load_all();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_is_empty_for_missing_dir() {
        let store = IndexStore::new("/nonexistent/indices");
        assert!(store.is_empty());
        assert!(store.load_all().is_empty());
    }

    #[test]
    fn test_is_empty_transitions() {
        let tmp = TempDir::new().unwrap();
        let store = IndexStore::new(tmp.path());
        assert!(store.is_empty());

        store.save(&sample_index("A")).unwrap();
        assert!(!store.is_empty());
    }
}
