//! The document store.
//!
//! Documents are scanned from the content directory into an immutable
//! [`Catalog`]. Requests take a snapshot of the current catalog, so a page
//! and its relations always come from the same scan. [`DocumentStore::refresh`]
//! swaps in a new catalog without touching snapshots already handed out.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};

use super::document::{Document, Format};
use super::paths::{is_valid_attachment_path, normalize_path, source_path_to_doc_path};

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Nothing is stored at the path. Callers answer this with a 404.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("content path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("content path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl StoreError {
    #[cfg(test)]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// An immutable index of documents keyed by normalized path.
///
/// Enumeration order is the path order, which keeps `all()` stable across
/// calls on the same catalog.
#[derive(Debug, Default)]
pub struct Catalog {
    documents: BTreeMap<String, Arc<Document>>,
}

impl Catalog {
    /// Build a catalog from documents. When two documents share a path
    /// (e.g. `about.md` and `about.html`) the first one wins.
    pub fn from_documents(documents: impl IntoIterator<Item = Document>) -> Self {
        let mut map = BTreeMap::new();
        for doc in documents {
            if let Some(existing) = map.get(&doc.path) {
                let existing: &Arc<Document> = existing;
                tracing::warn!(
                    path = %doc.path,
                    kept = %existing.source_path.display(),
                    ignored = %doc.source_path.display(),
                    "duplicate document path"
                );
                continue;
            }
            map.insert(doc.path.clone(), Arc::new(doc));
        }
        Self { documents: map }
    }

    /// Find the document at a path. The path is normalized first, so
    /// `/blog/post-1/` and `blog/post-1` name the same document.
    pub fn find(&self, path: &str) -> Result<Arc<Document>, StoreError> {
        normalize_path(path)
            .and_then(|normalized| self.documents.get(&normalized))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    /// Every document, in path order.
    pub fn all(&self) -> impl Iterator<Item = &Arc<Document>> {
        self.documents.values()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

// =============================================================================
// Document store
// =============================================================================

/// Filesystem-backed document store.
#[derive(Debug)]
pub struct DocumentStore {
    content_root: PathBuf,
    attachments_root: PathBuf,
    catalog: RwLock<Arc<Catalog>>,
}

impl DocumentStore {
    /// Open a store and scan the content directory.
    pub fn open(content_root: PathBuf, attachments_root: PathBuf) -> Result<Self, StoreError> {
        let catalog = scan(&content_root)?;
        tracing::info!(
            documents = catalog.len(),
            path = %content_root.display(),
            "scanned content"
        );
        if catalog.is_empty() {
            tracing::warn!(path = %content_root.display(), "content directory has no pages");
        }
        Ok(Self {
            content_root,
            attachments_root,
            catalog: RwLock::new(Arc::new(catalog)),
        })
    }

    /// A store over an already-built catalog. Nothing is read from disk
    /// until [`refresh`](Self::refresh) is called.
    #[cfg(test)]
    pub fn with_catalog(catalog: Catalog, content_root: PathBuf, attachments_root: PathBuf) -> Self {
        Self {
            content_root,
            attachments_root,
            catalog: RwLock::new(Arc::new(catalog)),
        }
    }

    /// Snapshot of the current catalog.
    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog.read().unwrap_or_else(PoisonError::into_inner))
    }

    #[cfg(test)]
    pub fn find(&self, path: &str) -> Result<Arc<Document>, StoreError> {
        self.catalog().find(path)
    }

    #[cfg(test)]
    pub fn all(&self) -> Vec<Arc<Document>> {
        self.catalog().all().cloned().collect()
    }

    /// Re-scan the content directory and replace the catalog.
    ///
    /// On error the previous catalog stays in place.
    pub fn refresh(&self) -> Result<usize, StoreError> {
        let catalog = scan(&self.content_root)?;
        let count = catalog.len();
        *self.catalog.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(catalog);
        tracing::info!(documents = count, "refreshed content");
        Ok(count)
    }

    /// Resolve an attachment path to an existing file under the attachment root.
    pub fn attachment(&self, path: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_attachment_path(path) {
            return Err(StoreError::NotFound(path.to_string()));
        }
        let file = self.attachments_root.join(path.trim_start_matches('/'));
        if file.is_file() {
            Ok(file)
        } else {
            Err(StoreError::NotFound(path.to_string()))
        }
    }
}

// =============================================================================
// Scanning
// =============================================================================

/// Scan a content directory into a catalog.
pub fn scan(content_root: &Path) -> Result<Catalog, StoreError> {
    if !content_root.exists() {
        return Err(StoreError::PathNotFound(content_root.to_path_buf()));
    }
    if !content_root.is_dir() {
        return Err(StoreError::NotADirectory(content_root.to_path_buf()));
    }

    let mut documents = Vec::new();
    walk_directory(content_root, Path::new(""), &mut documents)?;
    // Directory order is filesystem-dependent; sort so duplicate resolution is stable
    documents.sort_by(|a, b| a.source_path.cmp(&b.source_path));
    Ok(Catalog::from_documents(documents))
}

/// Recursively walk a directory and collect documents.
fn walk_directory(
    dir: &Path,
    relative_path: &Path,
    documents: &mut Vec<Document>,
) -> Result<(), StoreError> {
    let entries = std::fs::read_dir(dir).map_err(|e| StoreError::ReadDir {
        path: dir.to_path_buf(),
        source: e,
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| StoreError::ReadDir {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let path = entry.path();
        let file_name = entry.file_name();
        // Skip hidden files and directories
        if file_name.to_string_lossy().starts_with('.') {
            continue;
        }
        let relative = relative_path.join(&file_name);

        if path.is_dir() {
            walk_directory(&path, &relative, documents)?;
            continue;
        }

        let Some(format) = Format::from_path(&path) else {
            continue;
        };

        documents.push(load_document(&path, relative, format)?);
    }

    Ok(())
}

fn load_document(path: &Path, relative: PathBuf, format: Format) -> Result<Document, StoreError> {
    let read_error = |source| StoreError::ReadFile {
        path: path.to_path_buf(),
        source,
    };

    let text = std::fs::read_to_string(path).map_err(read_error)?;
    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(read_error)?;

    Ok(Document::from_source(
        source_path_to_doc_path(&relative),
        relative,
        format,
        &text,
        DateTime::<Utc>::from(modified),
    ))
}

// =============================================================================
// Attachment content types
// =============================================================================

/// Guess MIME type from file extension.
pub fn mime_from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        // Web assets
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        // Documents
        "pdf" => "application/pdf",
        "xml" => "application/xml",
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "zip" => "application/zip",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }

    fn content_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.md", "# Home");
        write(dir.path(), "about.md", "---\nheading: About\n---\nAbout us");
        write(dir.path(), "blog/post-1.mdown", "---\ndate: 2024-01-01\n---\n# Post 1");
        write(dir.path(), "blog/notes.txt", "not a document");
        write(dir.path(), ".hidden/secret.md", "# Hidden");
        dir
    }

    #[test]
    fn test_scan_discovers_documents() {
        let dir = content_dir();
        let catalog = scan(dir.path()).unwrap();

        let paths: Vec<&str> = catalog.all().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["", "about", "blog/post-1"]);

        let about = catalog.find("about").unwrap();
        assert_eq!(about.front_matter.heading.as_deref(), Some("About"));
        assert_eq!(about.raw_content, "About us");
        assert_eq!(about.format, Format::Markdown);
    }

    #[test]
    fn test_find_normalizes_path() {
        let dir = content_dir();
        let catalog = scan(dir.path()).unwrap();
        assert!(catalog.find("/blog/post-1/").is_ok());
        assert!(catalog.find("blog//post-1").is_ok());
        assert!(catalog.find("/").is_ok());
    }

    #[test]
    fn test_find_missing_is_not_found() {
        let dir = content_dir();
        let catalog = scan(dir.path()).unwrap();
        let err = catalog.find("missing").unwrap_err();
        assert!(err.is_not_found());
        assert!(catalog.find("/blog/../about").unwrap_err().is_not_found());
    }

    #[test]
    fn test_scan_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = scan(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, StoreError::PathNotFound(_)));
    }

    #[test]
    fn test_open_empty_content_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store =
            DocumentStore::open(dir.path().to_path_buf(), dir.path().join("attachments")).unwrap();
        assert!(store.catalog().is_empty());
        assert!(store.find("").unwrap_err().is_not_found());
    }

    #[test]
    fn test_duplicate_paths_keep_first() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "about.html", "<p>html</p>");
        write(dir.path(), "about.md", "markdown");
        let catalog = scan(dir.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.find("about").unwrap().format, Format::Html);
    }

    #[test]
    fn test_refresh_picks_up_new_documents() {
        let dir = content_dir();
        let store =
            DocumentStore::open(dir.path().to_path_buf(), dir.path().join("attachments")).unwrap();
        let before = store.catalog();
        assert!(store.find("contact").is_err());

        write(dir.path(), "contact.md", "# Contact");
        assert_eq!(store.refresh().unwrap(), 4);

        assert!(store.find("contact").is_ok());
        // Snapshots taken before the refresh are unaffected
        assert!(before.find("contact").is_err());
    }

    #[test]
    fn test_attachment_lookup() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "attachments/images/cat.png", "png");
        std::fs::create_dir_all(dir.path().join("pages")).unwrap();
        let store =
            DocumentStore::open(dir.path().join("pages"), dir.path().join("attachments")).unwrap();

        let file = store.attachment("images/cat.png").unwrap();
        assert!(file.ends_with("images/cat.png"));
        assert!(store.attachment("images/dog.png").unwrap_err().is_not_found());
        assert!(store.attachment("../pages").unwrap_err().is_not_found());
        assert!(store.attachment("images").unwrap_err().is_not_found());
    }

    #[test]
    fn test_mime_from_path() {
        assert_eq!(mime_from_path(Path::new("a.PNG")), "image/png");
        assert_eq!(mime_from_path(Path::new("a.pdf")), "application/pdf");
        assert_eq!(mime_from_path(Path::new("a")), "application/octet-stream");
    }
}
