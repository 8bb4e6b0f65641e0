//! Document scanning
//!
//! Reads the markdown documents of one entity type from its folder, parsing
//! the YAML front matter into a [`FieldBag`]. Documents without a parseable
//! header are skipped silently — registries accumulate scratch files and
//! half-written notes, and those must never break a load.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;
use walkdir::WalkDir;

use crate::fields::FieldBag;

/// Template files are skipped regardless of header validity.
pub const TEMPLATE_SENTINEL: &str = "_template.md";

/// One scanned document: header parsed, body kept verbatim.
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Filename without the `.md` extension; unique within its type folder.
    pub slug: String,
    /// Absolute path of the source file.
    pub path: PathBuf,
    /// Path relative to the registry root, for display and diagnostics.
    pub relative_path: String,
    /// Parsed header fields.
    pub header: FieldBag,
    /// Markdown body below the header fence.
    pub body: String,
}

fn front_matter_fence() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)\A---[ \t]*\r?\n(.*?)\r?\n---[ \t]*(?:\r?\n|\z)").expect("fence regex")
    })
}

/// Split a document into header fields and body.
///
/// Returns `None` when there is no leading `---` fence, or when the fenced
/// text is not a YAML mapping — both cases mean "not a registry document".
pub fn parse_front_matter(content: &str) -> Option<(FieldBag, String)> {
    let captures = front_matter_fence().captures(content)?;
    let header_text = captures.get(1)?.as_str();
    let body = content[captures.get(0)?.end()..].to_string();

    match serde_yaml::from_str::<serde_yaml::Value>(header_text) {
        Ok(serde_yaml::Value::Mapping(mapping)) => Some((FieldBag::from_mapping(mapping), body)),
        _ => None,
    }
}

/// Scan one entity-type folder for documents.
///
/// A missing folder yields an empty list. Entries are walked in filename
/// order so the scan output is stable across hosts and runs.
pub fn scan_type_folder(folder: &Path, registry_root: &Path) -> Vec<RawDocument> {
    let mut documents = Vec::new();

    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !file_name.ends_with(".md") || file_name == TEMPLATE_SENTINEL {
            continue;
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                debug!(path = %path.display(), %err, "skipping unreadable document");
                continue;
            }
        };

        let Some((header, body)) = parse_front_matter(&content) else {
            debug!(path = %path.display(), "skipping document without a valid header");
            continue;
        };

        let relative_path = path
            .strip_prefix(registry_root)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string();

        documents.push(RawDocument {
            slug: file_name.trim_end_matches(".md").to_string(),
            path: path.to_path_buf(),
            relative_path,
            header,
            body,
        });
    }

    documents
}
