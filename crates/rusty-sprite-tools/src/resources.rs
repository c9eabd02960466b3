//! Static reference material served as MCP resources.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::json;
use tracing::warn;

const BUILTIN_REFERENCE: &str = include_str!("../resources/reference.txt");
const BUILTIN_EXAMPLES: &str = include_str!("../resources/examples.txt");

/// A resource the server advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResourceInfo {
    pub uri: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "mimeType")]
    pub mime_type: &'static str,
}

struct Entry {
    info: ResourceInfo,
    file: &'static str,
    builtin: &'static str,
}

const ENTRIES: &[Entry] = &[
    Entry {
        info: ResourceInfo {
            uri: "docs://reference",
            name: "reference",
            description: "LibreSprite scripting API reference",
            mime_type: "text/plain",
        },
        file: "reference.txt",
        builtin: BUILTIN_REFERENCE,
    },
    Entry {
        info: ResourceInfo {
            uri: "docs://examples",
            name: "examples",
            description: "Example LibreSprite scripts",
            mime_type: "text/plain",
        },
        file: "examples.txt",
        builtin: BUILTIN_EXAMPLES,
    },
];

/// Serves `docs://reference` and `docs://examples`.
///
/// Without a directory the compiled-in copies are returned. With one, each
/// read goes to `<dir>/<file>` so edits show up without a restart.
#[derive(Debug, Clone, Default)]
pub struct ResourceStore {
    dir: Option<PathBuf>,
}

impl ResourceStore {
    pub fn builtin() -> Self {
        Self { dir: None }
    }

    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn list(&self) -> Vec<ResourceInfo> {
        ENTRIES.iter().map(|e| e.info).collect()
    }

    /// Resource text for `uri`, or `None` when the URI is unknown.
    ///
    /// A file that cannot be read yields `Error reading <file>: <reason>` as
    /// the text rather than a failure.
    pub async fn read(&self, uri: &str) -> Option<String> {
        let entry = ENTRIES.iter().find(|e| e.info.uri == uri)?;
        let Some(dir) = &self.dir else {
            return Some(entry.builtin.to_string());
        };

        let path = dir.join(entry.file);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(path = %path.display(), "Failed to read resource: {e}");
                Some(format!("Error reading {}: {e}", entry.file))
            }
        }
    }

    /// MCP `resources/list` entries.
    pub fn to_mcp_resources(&self) -> Vec<serde_json::Value> {
        self.list()
            .into_iter()
            .map(|info| json!(info))
            .collect()
    }
}
