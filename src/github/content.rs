// src/github/content.rs
// =============================================================================
// Data types returned by the GitHub contents API.
//
// A "content entry" is one record in a directory listing (or the single record
// returned when the path points at a file). Directory listings do not carry
// file bodies; fetching a file path does, base64 encoded.
//
// Rust concepts:
// - serde derive: Turning JSON into structs without hand-written parsing
// - Option<T>: Fields the API only sends for some entries
// =============================================================================

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// The only content encoding we know how to turn back into text.
pub const BASE64_ENCODING: &str = "base64";

/// What kind of thing a content entry is.
///
/// GitHub sends this as the lowercase `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    File,
    Dir,
    Symlink,
    Submodule,
}

/// One file-or-directory record from a contents listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentEntry {
    /// Last path component, e.g. "index.js"
    pub name: String,
    /// Path from the repository root, e.g. "src/index.js"
    pub path: String,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    /// Only present when a single file was requested
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub size: u64,
}

impl ContentEntry {
    /// Builds a directory entry. Handy for fakes and tests.
    #[cfg(test)]
    pub fn dir(path: &str) -> Self {
        Self {
            name: last_segment(path),
            path: path.to_string(),
            kind: ContentKind::Dir,
            encoding: None,
            content: None,
            size: 0,
        }
    }

    /// Builds a file entry as it appears in a directory listing (no body).
    #[cfg(test)]
    pub fn file(path: &str) -> Self {
        Self {
            name: last_segment(path),
            path: path.to_string(),
            kind: ContentKind::File,
            encoding: None,
            content: None,
            size: 0,
        }
    }

    /// Builds a file entry carrying `text` as base64, like a single-file fetch.
    #[cfg(test)]
    pub fn file_with_text(path: &str, text: &str) -> Self {
        Self {
            encoding: Some(BASE64_ENCODING.to_string()),
            content: Some(STANDARD.encode(text)),
            size: text.len() as u64,
            ..Self::file(path)
        }
    }

    /// True when the name ends in one of `suffixes` (exact, case-sensitive).
    pub fn has_suffix(&self, suffixes: &[String]) -> bool {
        suffixes.iter().any(|suffix| self.name.ends_with(suffix.as_str()))
    }

    /// True when the entry's encoding is the text-safe one we can decode.
    pub fn is_base64(&self) -> bool {
        self.encoding.as_deref() == Some(BASE64_ENCODING)
    }

    /// True when there is no body to decode.
    pub fn is_empty(&self) -> bool {
        self.content.as_deref().map_or(true, str::is_empty)
    }

    /// Decodes the base64 body into UTF-8 text.
    ///
    /// GitHub wraps the payload at 60 columns, so whitespace is stripped
    /// before decoding.
    pub fn decoded_text(&self) -> Result<String> {
        let raw = self.content.as_deref().unwrap_or_default();
        let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

        let bytes = STANDARD
            .decode(compact.as_bytes())
            .with_context(|| format!("{} is not valid base64", self.path))?;

        String::from_utf8(bytes).with_context(|| format!("{} is not valid UTF-8", self.path))
    }
}

#[cfg(test)]
fn last_segment(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_listing_entry() {
        let json = r#"{"name":"src","path":"lib/src","type":"dir","size":0,"sha":"abc"}"#;
        let entry: ContentEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.kind, ContentKind::Dir);
        assert_eq!(entry.path, "lib/src");
        assert!(entry.encoding.is_none());
    }

    #[test]
    fn test_decode_wrapped_base64() {
        let entry = ContentEntry {
            encoding: Some("base64".to_string()),
            // "hello world" split across lines the way GitHub does it
            content: Some("aGVsbG8g\nd29ybGQ=\n".to_string()),
            ..ContentEntry::file("a.js")
        };
        assert_eq!(entry.decoded_text().unwrap(), "hello world");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let entry = ContentEntry {
            encoding: Some("base64".to_string()),
            content: Some("***".to_string()),
            ..ContentEntry::file("a.js")
        };
        assert!(entry.decoded_text().is_err());
    }

    #[test]
    fn test_suffix_match_is_case_sensitive() {
        let suffixes = vec![".js".to_string(), ".ts".to_string()];
        assert!(ContentEntry::file("lib/index.js").has_suffix(&suffixes));
        assert!(ContentEntry::file("types.d.ts").has_suffix(&suffixes));
        assert!(!ContentEntry::file("index.JS").has_suffix(&suffixes));
        assert!(!ContentEntry::file("README.md").has_suffix(&suffixes));
    }

    #[test]
    fn test_empty_content() {
        assert!(ContentEntry::file("a.js").is_empty());
        assert!(!ContentEntry::file_with_text("a.js", "x").is_empty());
    }
}
