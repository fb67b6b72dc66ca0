//! Directory listing entries.

use crate::path;
use serde::{Deserialize, Serialize};

/// Type of a remote filesystem entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum EntryKind {
    File,
    Directory,
}

/// One entry from a directory listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEntry {
    /// Bare name, never a path.
    pub name: String,
    pub kind: EntryKind,
    /// Folder the entry was listed from.
    pub parent: String,
    /// Size reported by the listing, when the server sent one.
    #[serde(default)]
    pub size: Option<u64>,
}

impl RemoteEntry {
    pub fn new(name: impl Into<String>, kind: EntryKind, parent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            parent: parent.into(),
            size: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Full path built from `parent` and `name`.
    pub fn path(&self) -> String {
        path::join(&self.parent, &self.name)
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// `.` and `..` as returned by some servers.
    pub fn is_pseudo(&self) -> bool {
        self.name == "." || self.name == ".."
    }
}
