use clap::ValueEnum;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Serialize, ValueEnum, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Console,
    Json,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    /// A `$c` or `$u` directory under a title directory the catalog does not know.
    #[serde(rename = "unknown_title_dir")]
    UnknownTitleDir,
    #[serde(rename = "content_unknown")]
    ContentUnknown,
    #[serde(rename = "content_archived")]
    ContentArchived,
    #[serde(rename = "content_unarchived")]
    ContentUnarchived,
    #[serde(rename = "update_known")]
    UpdateKnown,
    #[serde(rename = "update_unknown")]
    UpdateUnknown,
    #[serde(rename = "hash_error")]
    HashError,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::UnknownTitleDir,
        EventKind::ContentUnknown,
        EventKind::ContentArchived,
        EventKind::ContentUnarchived,
        EventKind::UpdateKnown,
        EventKind::UpdateUnknown,
        EventKind::HashError,
    ];
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::UnknownTitleDir => write!(f, "unrecognized title directory"),
            EventKind::ContentUnknown => write!(f, "unknown content"),
            EventKind::ContentArchived => write!(f, "archived content"),
            EventKind::ContentUnarchived => write!(f, "unarchived content"),
            EventKind::UpdateKnown => write!(f, "known update"),
            EventKind::UpdateUnknown => write!(f, "unknown update"),
            EventKind::HashError => write!(f, "hash error"),
        }
    }
}

/// One outcome of comparing something found on disk against the catalog.
///
/// `path` is relative to the scan root. `detail` holds the archive name,
/// update name, error text, or the unrecognized subdirectory name depending
/// on `kind`; `sha1` is only set for update events.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ClassificationEvent {
    pub kind: EventKind,
    pub title_id: String,
    pub title_name: Option<String>,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
}

impl ClassificationEvent {
    pub fn new(kind: EventKind, title_id: &str, path: PathBuf) -> Self {
        Self {
            kind,
            title_id: title_id.to_string(),
            title_name: None,
            path,
            detail: None,
            sha1: None,
        }
    }

    pub fn with_title_name(mut self, name: &str) -> Self {
        self.title_name = Some(name.to_string());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_sha1(mut self, sha1: impl Into<String>) -> Self {
        self.sha1 = Some(sha1.into());
        self
    }
}
