//! Document metadata extraction
//!
//! Metadata is read from explicit labeled fields in the first pages when
//! present; every field has a path-derived fallback so no document is ever
//! rejected for missing headers. The corpus carries both Spanish and English
//! labels, so both spellings are matched.

use chrono::Utc;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Metadata for one source document
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMeta {
    /// Stable document code (e.g. `PROC-RET-001`)
    pub code: String,

    /// Human-readable title
    pub title: String,

    /// Category (parent directory name, or "general" at the root)
    pub category: String,

    /// Document version
    pub version: String,

    /// Document date (YYYY-MM-DD or DD/MM/YYYY as found)
    pub date: String,

    /// Source file name
    pub source_file: String,
}

fn code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(?:CÓDIGO|CODIGO|CODE):\s*([A-Z0-9\-]+)").unwrap())
}

fn version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(?:VERSIÓN|VERSION|VER\.):\s*([\d.]+)").unwrap())
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:FECHA|DATE):\s*(\d{4}-\d{2}-\d{2}|\d{2}/\d{2}/\d{4})").unwrap()
    })
}

fn title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(?:PROCEDIMIENTO|PROCEDURE):\s*(.+)").unwrap())
}

fn code_stem_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)proc-(\w+)-(\d+)").unwrap())
}

/// Extract metadata from the first pages of a document, falling back to
/// path-derived inference field by field.
///
/// `base` is the scan root: a document directly under it gets the
/// "general" category, deeper documents get their parent directory name.
pub fn extract(first_pages: &str, path: &Path, base: Option<&Path>) -> SourceMeta {
    let code = code_re()
        .captures(first_pages)
        .map(|c| c[1].to_uppercase())
        .unwrap_or_else(|| infer_code(path));

    let version = version_re()
        .captures(first_pages)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| "1.0".to_string());

    let date = date_re()
        .captures(first_pages)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string());

    let title = title_re()
        .captures(first_pages)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_else(|| infer_title(path));

    SourceMeta {
        code,
        title,
        category: infer_category(path, base),
        version,
        date,
        source_file: path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
    }
}

/// Derive a document code from the file stem.
///
/// A `proc-xxx-nnn`-shaped stem normalizes to `PROC-XXX-NNN`; any other stem
/// is uppercased with separators unified to dashes.
pub fn infer_code(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    if let Some(captures) = code_stem_re().captures(&stem) {
        return format!("PROC-{}-{}", captures[1].to_uppercase(), &captures[2]);
    }

    stem.replace(['_', ' '], "-").to_uppercase()
}

/// Category is the parent directory name; documents at the scan root are
/// "general".
pub fn infer_category(path: &Path, base: Option<&Path>) -> String {
    let parent = match path.parent() {
        Some(p) => p,
        None => return "general".to_string(),
    };

    if let Some(base) = base {
        if parent == base {
            return "general".to_string();
        }
    }

    match parent.file_name() {
        Some(name) => {
            let name = name.to_string_lossy().to_string();
            if name == "documents" || name.is_empty() {
                "general".to_string()
            } else {
                name
            }
        }
        None => "general".to_string(),
    }
}

/// Humanize the file stem into a title
pub fn infer_title(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    stem.replace(['_', '-'], " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_labeled_fields_win() {
        let content = "PROCEDURE: Early Retirement Request\nCODE: PROC-RET-002\nVERSION: 2.1\nDATE: 2024-03-15";
        let path = PathBuf::from("/data/documents/retirement/whatever.txt");

        let meta = extract(content, &path, None);
        assert_eq!(meta.code, "PROC-RET-002");
        assert_eq!(meta.title, "Early Retirement Request");
        assert_eq!(meta.version, "2.1");
        assert_eq!(meta.date, "2024-03-15");
        assert_eq!(meta.category, "retirement");
    }

    #[test]
    fn test_spanish_labels() {
        let content = "PROCEDIMIENTO: Jubilación Anticipada\nCÓDIGO: PROC-JUB-002\nVERSIÓN: 1.3";
        let path = PathBuf::from("/data/documents/jubilacion/proc-jub-002.txt");

        let meta = extract(content, &path, None);
        assert_eq!(meta.code, "PROC-JUB-002");
        assert_eq!(meta.title, "Jubilación Anticipada");
        assert_eq!(meta.version, "1.3");
    }

    #[test]
    fn test_code_inferred_from_stem() {
        let path = PathBuf::from("/docs/proc-ret-001.txt");
        assert_eq!(infer_code(&path), "PROC-RET-001");

        let path = PathBuf::from("/docs/transfer_guide v2.txt");
        assert_eq!(infer_code(&path), "TRANSFER-GUIDE-V2");
    }

    #[test]
    fn test_title_humanized_from_stem() {
        let path = PathBuf::from("/docs/early_retirement-guide.md");
        assert_eq!(infer_title(&path), "Early Retirement Guide");
    }

    #[test]
    fn test_category_at_scan_root_is_general() {
        let base = PathBuf::from("/data/documents");
        let path = base.join("doc.txt");
        assert_eq!(infer_category(&path, Some(&base)), "general");

        let nested = base.join("claims").join("doc.txt");
        assert_eq!(infer_category(&nested, Some(&base)), "claims");
    }

    #[test]
    fn test_all_fallbacks() {
        let path = PathBuf::from("/data/documents/pensions/monthly_payment.txt");
        let meta = extract("no labels anywhere in this text", &path, None);

        assert_eq!(meta.code, "MONTHLY-PAYMENT");
        assert_eq!(meta.title, "Monthly Payment");
        assert_eq!(meta.category, "pensions");
        assert_eq!(meta.version, "1.0");
        assert_eq!(meta.source_file, "monthly_payment.txt");
        // Date falls back to today
        assert_eq!(meta.date.len(), 10);
    }
}
