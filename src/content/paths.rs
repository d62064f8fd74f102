//! Path conversion utilities.
//!
//! This module handles conversions between:
//! - Source file paths (relative paths within the content directory)
//! - Document paths (the normalized key a document is stored under)
//! - Request paths (whatever arrives in the URL)

use std::path::Path;

/// Convert a source-relative file path to a document path.
///
/// # Examples
/// ```ignore
/// source_path_to_doc_path("about.md") => "about"
/// source_path_to_doc_path("blog/post-1.md") => "blog/post-1"
/// source_path_to_doc_path("blog/index.md") => "blog"
/// source_path_to_doc_path("index.md") => ""
/// ```
pub fn source_path_to_doc_path(path: &Path) -> String {
    let path_str = path.with_extension("").to_string_lossy().replace('\\', "/");

    // Index files become the directory path
    let path_str = if path_str == "index" {
        ""
    } else {
        path_str.strip_suffix("/index").unwrap_or(&path_str)
    };

    path_str.trim_matches('/').to_string()
}

/// Normalize a request or front-matter path to a document path.
///
/// Leading, trailing and repeated slashes are dropped. Returns `None` for
/// paths containing `.` or `..` segments, which never name a document.
///
/// # Examples
/// ```ignore
/// normalize_path("/blog/post-1/") => Some("blog/post-1")
/// normalize_path("/") => Some("")
/// normalize_path("/a/../b") => None
/// ```
pub fn normalize_path(path: &str) -> Option<String> {
    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" => continue,
            "." | ".." => return None,
            s => segments.push(s),
        }
    }
    Some(segments.join("/"))
}

/// The absolute URL path of a document path ("blog/post-1" -> "/blog/post-1").
pub fn abspath(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

/// Check an attachment path against the characters attachments may use:
/// word characters, `.`, `-` and `/`, with no `..` segments.
pub fn is_valid_attachment_path(path: &str) -> bool {
    !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-' | '/'))
        && !path.split('/').any(|s| s == "..")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_path_to_doc_path_simple() {
        assert_eq!(source_path_to_doc_path(Path::new("about.md")), "about");
        assert_eq!(
            source_path_to_doc_path(Path::new("blog/post-1.mdown")),
            "blog/post-1"
        );
    }

    #[test]
    fn test_source_path_to_doc_path_index() {
        assert_eq!(source_path_to_doc_path(Path::new("index.md")), "");
        assert_eq!(source_path_to_doc_path(Path::new("blog/index.html")), "blog");
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/blog/post-1/").as_deref(), Some("blog/post-1"));
        assert_eq!(normalize_path("blog//post-1").as_deref(), Some("blog/post-1"));
        assert_eq!(normalize_path("/").as_deref(), Some(""));
        assert_eq!(normalize_path("").as_deref(), Some(""));
        assert_eq!(normalize_path("/a/../b"), None);
        assert_eq!(normalize_path("./a"), None);
    }

    #[test]
    fn test_abspath() {
        assert_eq!(abspath("blog/post-1"), "/blog/post-1");
        assert_eq!(abspath(""), "/");
    }

    #[test]
    fn test_valid_attachment_path() {
        assert!(is_valid_attachment_path("images/photo-1.jpg"));
        assert!(is_valid_attachment_path("report_2024.pdf"));
        assert!(!is_valid_attachment_path("../secret"));
        assert!(!is_valid_attachment_path("a/../../b"));
        assert!(!is_valid_attachment_path("with space.png"));
        assert!(!is_valid_attachment_path(""));
    }
}
