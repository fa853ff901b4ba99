//! Knowledge-base directory loading.
//!
//! Reads every supported file under the corpus directory into
//! [`SourceDocument`]s: plain-text variants in full, PDFs one document per
//! page. Files that fail to load are skipped and reported as warnings, so
//! one bad file never takes down a reindex.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::document::SourceDocument;
use crate::error::{RagError, Result};

/// File extensions read as plain UTF-8 text.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "text"];

/// The outcome of scanning the corpus directory.
#[derive(Debug)]
pub struct CorpusLoad {
    /// Every document that loaded successfully, in stable path order.
    pub documents: Vec<SourceDocument>,
    /// Files that were skipped, with the reason.
    pub warnings: Vec<LoadWarning>,
}

/// A file that could not be loaded and was skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadWarning {
    /// Path of the skipped file.
    pub path: PathBuf,
    /// Why it was skipped.
    pub reason: String,
}

/// Load every supported document under `root`.
///
/// Traversal order is lexicographic by file name, so a fixed directory
/// snapshot always produces the same document sequence. Files with
/// unrecognized extensions are skipped silently; files that fail to load
/// are skipped with a warning.
///
/// # Errors
///
/// - [`RagError::CorpusNotFound`] if `root` is not a directory.
/// - [`RagError::EmptyCorpus`] if the scan produced zero documents.
pub fn load_directory(root: &Path) -> Result<CorpusLoad> {
    if !root.is_dir() {
        return Err(RagError::CorpusNotFound(root.to_path_buf()));
    }

    let mut documents = Vec::new();
    let mut warnings = Vec::new();

    let entries = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file());

    for entry in entries {
        let path = entry.path();
        let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
            debug!(path = %path.display(), "skipping file without extension");
            continue;
        };

        let loaded = match extension.to_ascii_lowercase().as_str() {
            ext if TEXT_EXTENSIONS.contains(&ext) => load_text(root, path),
            "pdf" => load_pdf(root, path),
            _ => {
                debug!(path = %path.display(), "skipping unsupported extension");
                continue;
            }
        };

        match loaded {
            Ok(mut docs) => documents.append(&mut docs),
            Err(reason) => {
                warn!(path = %path.display(), %reason, "skipping unreadable file");
                warnings.push(LoadWarning { path: path.to_path_buf(), reason });
            }
        }
    }

    if documents.is_empty() {
        return Err(RagError::EmptyCorpus(root.to_path_buf()));
    }

    Ok(CorpusLoad { documents, warnings })
}

fn document_id(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).to_string_lossy().into_owned()
}

fn load_text(root: &Path, path: &Path) -> std::result::Result<Vec<SourceDocument>, String> {
    let bytes = fs::read(path).map_err(|e| e.to_string())?;
    // Undecodable bytes are replaced rather than failing the file.
    let content = String::from_utf8_lossy(&bytes).into_owned();
    Ok(vec![SourceDocument {
        id: document_id(root, path),
        content,
        origin: path.to_path_buf(),
    }])
}

fn load_pdf(root: &Path, path: &Path) -> std::result::Result<Vec<SourceDocument>, String> {
    let pages = pdf_extract::extract_text_by_pages(path).map_err(|e| e.to_string())?;
    let id = document_id(root, path);
    Ok(pages
        .into_iter()
        .enumerate()
        .map(|(i, content)| SourceDocument {
            id: format!("{id}#page={}", i + 1),
            content,
            origin: path.to_path_buf(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn missing_directory_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("no-existe");
        let result = load_directory(&missing);
        assert!(matches!(result, Err(RagError::CorpusNotFound(path)) if path == missing));
    }

    #[test]
    fn directory_without_supported_files_is_empty() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("datos.bin"), [0u8, 1, 2]).unwrap();
        fs::write(temp.path().join("imagen.png"), [137u8, 80, 78, 71]).unwrap();

        let result = load_directory(temp.path());
        assert!(matches!(result, Err(RagError::EmptyCorpus(_))));
    }

    #[test]
    fn loads_text_files_in_stable_order() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("b_manual.md"), "manual").unwrap();
        fs::write(temp.path().join("a_faq.txt"), "faq").unwrap();
        fs::write(temp.path().join("c_datos.bin"), [0u8]).unwrap();

        let load = load_directory(temp.path()).unwrap();
        let ids: Vec<&str> = load.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a_faq.txt", "b_manual.md"]);
        assert!(load.warnings.is_empty());
        assert_eq!(load.documents[0].origin, temp.path().join("a_faq.txt"));
    }

    #[test]
    fn descends_into_subdirectories() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir(temp.path().join("guias")).unwrap();
        fs::write(temp.path().join("guias").join("alta.txt"), "alta de usuario").unwrap();

        let load = load_directory(temp.path()).unwrap();
        assert_eq!(load.documents.len(), 1);
        assert_eq!(load.documents[0].content, "alta de usuario");
    }

    #[test]
    fn undecodable_bytes_are_replaced_not_fatal() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("roto.txt"), [b'h', b'o', 0xFF, b'l', b'a']).unwrap();

        let load = load_directory(temp.path()).unwrap();
        assert_eq!(load.documents.len(), 1);
        assert!(load.documents[0].content.contains('\u{FFFD}'));
        assert!(load.warnings.is_empty());
    }

    #[test]
    fn unreadable_files_become_warnings() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("faq.txt"), "P: ... R: ...").unwrap();
        fs::write(temp.path().join("roto.pdf"), b"esto no es un pdf").unwrap();

        let load = load_directory(temp.path()).unwrap();
        assert_eq!(load.documents.len(), 1);
        assert_eq!(load.warnings.len(), 1);
        assert_eq!(load.warnings[0].path, temp.path().join("roto.pdf"));
    }
}
