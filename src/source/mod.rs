//! Page-addressed document sources
//!
//! A page is the minimal addressable unit of a document. Text sources (.txt,
//! .md) split pages on the form-feed character, the convention used by text
//! extracted from paginated originals; a file without form feeds is a single
//! page. Binary formats (PDF, DOCX) are external collaborators behind the
//! same [`PageSource`] boundary and are not read here.

pub mod meta;

use crate::errors::{EngineError, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub use meta::SourceMeta;

/// Page separator in extracted text (form feed)
pub const PAGE_BREAK: char = '\u{000C}';

/// File extensions this crate reads natively
pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["md", "txt"];

/// One extracted page, 1-indexed
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Page number, starting at 1
    pub number: u32,

    /// Page text, trimmed
    pub text: String,
}

/// Page-addressed read access to one document
pub trait PageSource: Send + Sync {
    /// Extract the full ordered page sequence
    fn read_pages(&self) -> Result<Vec<Page>>;

    /// Read only the inclusive page range `start..=end`
    fn read_page_range(&self, start: u32, end: u32) -> Result<String>;

    /// Path of the underlying file
    fn path(&self) -> &Path;
}

/// Plain-text source with form-feed page separators
pub struct TextSource {
    path: PathBuf,
}

impl TextSource {
    /// Open a text source, verifying the file exists
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(EngineError::Source(format!(
                "document does not exist: {}",
                path.display()
            )));
        }
        Ok(Self { path })
    }
}

impl PageSource for TextSource {
    fn read_pages(&self) -> Result<Vec<Page>> {
        let content = fs::read_to_string(&self.path)?;

        let pages: Vec<Page> = content
            .split(PAGE_BREAK)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .enumerate()
            .map(|(i, text)| Page {
                number: (i + 1) as u32,
                text: text.to_string(),
            })
            .collect();

        if pages.is_empty() {
            return Err(EngineError::Source(format!(
                "no text extracted from {}",
                self.path.display()
            )));
        }

        Ok(pages)
    }

    fn read_page_range(&self, start: u32, end: u32) -> Result<String> {
        if start == 0 || end < start {
            return Err(EngineError::Source(format!(
                "invalid page range {}-{}",
                start, end
            )));
        }

        let pages = self.read_pages()?;
        let total = pages.len() as u32;
        if end > total {
            return Err(EngineError::Source(format!(
                "page range {}-{} exceeds {} pages in {}",
                start,
                end,
                total,
                self.path.display()
            )));
        }

        let text = pages
            .iter()
            .filter(|p| p.number >= start && p.number <= end)
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(text)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Open a document through the right source implementation for its format
pub fn open_source(path: &Path) -> Result<Box<dyn PageSource>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(Box::new(TextSource::open(path)?))
    } else {
        Err(EngineError::Source(format!(
            "unsupported document format: {}",
            path.display()
        )))
    }
}

/// A document read in full, with inferred metadata
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Stable identifier (metadata code)
    pub id: String,

    /// Full document text, pages joined
    pub content: String,

    /// Inferred metadata
    pub meta: SourceMeta,
}

/// Recursively collect all supported documents under a directory, sorted by
/// path for deterministic processing order.
pub fn discover_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(EngineError::Source(format!(
            "document directory does not exist: {}",
            dir.display()
        )));
    }

    let mut found = Vec::new();
    collect_documents(dir, &mut found)?;
    found.sort();
    Ok(found)
}

fn collect_documents(dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_documents(&path, found)?;
        } else if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            if SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
                found.push(path);
            }
        }
    }
    Ok(())
}

/// Read every supported document under `dir` in full.
///
/// Unreadable or empty files are skipped, not fatal: the judge path must
/// evaluate whatever corpus is actually readable.
pub fn read_all_documents(dir: &Path) -> Result<Vec<RawDocument>> {
    let mut documents = Vec::new();

    for path in discover_documents(dir)? {
        let source = match open_source(&path) {
            Ok(s) => s,
            Err(_) => continue,
        };
        let pages = match source.read_pages() {
            Ok(p) => p,
            Err(_) => continue,
        };

        let first_pages = pages
            .iter()
            .take(3)
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let meta = meta::extract(&first_pages, &path, Some(dir));

        let content = pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        documents.push(RawDocument {
            id: meta.code.clone(),
            content,
            meta,
        });
    }

    Ok(documents)
}
