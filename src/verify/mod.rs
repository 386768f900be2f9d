//! Directory walk that maps a dump tree onto catalog entries.
//!
//! Title directories are recognized by their 8 character names. Known titles
//! get their `$c` and `$u` subtrees classified; unknown titles are flagged
//! when they carry either subtree and are then skipped entirely.

mod content;
mod updates;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::catalog::Catalog;
use crate::sink::EventSink;
use crate::types::{ClassificationEvent, EventKind};

pub use content::classify_content;
pub use updates::classify_updates;

/// Downloadable content lives under `<title>/$c/<content id>/`.
pub const CONTENT_DIR: &str = "$c";
/// Title update executables live directly under `<title>/$u/`.
pub const UPDATE_DIR: &str = "$u";

const TITLE_ID_LEN: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("scan root not found: {}", .0.display())]
    MissingRoot(PathBuf),

    #[error("failed to list directory {}: {source}", path.display())]
    DirectoryList {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    pub(crate) fn listing(path: &Path, source: io::Error) -> Self {
        ScanError::DirectoryList {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl From<walkdir::Error> for ScanError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
        let message = err.to_string();
        let source = err
            .into_io_error()
            .unwrap_or_else(|| io::Error::other(message));
        ScanError::DirectoryList { path, source }
    }
}

/// Read-only audit of one dump tree against a catalog.
pub struct Verifier<'a> {
    catalog: &'a Catalog,
    root: PathBuf,
    verbose: u8,
}

impl<'a> Verifier<'a> {
    pub fn new(catalog: &'a Catalog, root: impl Into<PathBuf>) -> Self {
        Self {
            catalog,
            root: root.into(),
            verbose: 0,
        }
    }

    pub fn verbose(mut self, verbose: u8) -> Self {
        self.verbose = verbose;
        self
    }

    /// Walk the tree depth-first and report every finding to `sink`.
    ///
    /// Only a missing root or an unreadable directory stops the walk; every
    /// other outcome is an event.
    pub fn run(&self, sink: &mut dyn EventSink) -> Result<(), ScanError> {
        if !self.root.exists() {
            return Err(ScanError::MissingRoot(self.root.clone()));
        }

        let mut walker = WalkDir::new(&self.root).sort_by_file_name().into_iter();
        while let Some(entry) = walker.next() {
            let entry = entry?;
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                continue;
            }
            let Some(title_id) = title_id_of(entry.file_name().to_str()) else {
                continue;
            };

            match self.catalog.get(&title_id) {
                Some(title) => {
                    vprintln!(
                        self.verbose,
                        1,
                        "scanning title {} ({})",
                        title.title_name,
                        title_id
                    );
                    sink.header(&title_id, &title.title_name);

                    let content_dir = entry.path().join(CONTENT_DIR);
                    if is_dir(&content_dir) {
                        classify_content(
                            &content_dir,
                            title,
                            &title_id,
                            &self.root,
                            self.verbose,
                            sink,
                        )?;
                    }
                    let update_dir = entry.path().join(UPDATE_DIR);
                    if is_dir(&update_dir) {
                        classify_updates(
                            &update_dir,
                            title,
                            &title_id,
                            &self.root,
                            self.verbose,
                            sink,
                        )?;
                    }
                }
                None => {
                    self.flag_unknown_title(entry.path(), &title_id, sink);
                    walker.skip_current_dir();
                }
            }
        }

        Ok(())
    }

    fn flag_unknown_title(&self, dir: &Path, title_id: &str, sink: &mut dyn EventSink) {
        let mut flagged = false;
        for sub in [CONTENT_DIR, UPDATE_DIR] {
            let candidate = dir.join(sub);
            if is_dir(&candidate) {
                flagged = true;
                let event = ClassificationEvent::new(
                    EventKind::UnknownTitleDir,
                    title_id,
                    relative_to_root(&candidate, &self.root),
                )
                .with_detail(sub);
                sink.emit(&event);
            }
        }
        if !flagged {
            vprintln!(
                self.verbose,
                2,
                "skipping {:?}: {} is not in the catalog",
                dir,
                title_id
            );
        }
    }
}

/// Lowercased title id for a directory name of exactly eight characters.
pub fn title_id_of(name: Option<&str>) -> Option<String> {
    let name = name?;
    (name.chars().count() == TITLE_ID_LEN).then(|| name.to_lowercase())
}

pub(crate) fn relative_to_root(path: &Path, root: &Path) -> PathBuf {
    pathdiff::diff_paths(path, root).unwrap_or_else(|| path.to_path_buf())
}

fn is_dir(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}

/// Immediate entries of `dir` in file name order.
pub(crate) fn sorted_entries(dir: &Path) -> Result<Vec<fs::DirEntry>, ScanError> {
    let mut entries = fs::read_dir(dir)
        .and_then(|iter| iter.collect::<io::Result<Vec<_>>>())
        .map_err(|e| ScanError::listing(dir, e))?;
    entries.sort_by_key(|entry| entry.file_name());
    Ok(entries)
}
