use std::path::Path;

use crate::catalog::TitleData;
use crate::sink::EventSink;
use crate::types::{ClassificationEvent, EventKind};

use super::{ScanError, relative_to_root, sorted_entries};

const CONTENT_META_MARKER: &str = "contentmeta.xbx";

/// Classify each content package directory under a title's `$c` directory.
///
/// A subdirectory counts as a package only when it directly holds a file whose
/// name contains `contentmeta.xbx` (any case). Anything else is skipped silently.
pub fn classify_content(
    content_dir: &Path,
    title: &TitleData,
    title_id: &str,
    root: &Path,
    verbose: u8,
    sink: &mut dyn EventSink,
) -> Result<(), ScanError> {
    for entry in sorted_entries(content_dir)? {
        let file_type = entry
            .file_type()
            .map_err(|e| ScanError::listing(content_dir, e))?;
        if !file_type.is_dir() {
            continue;
        }

        let package_dir = entry.path();
        if !has_content_meta(&package_dir)? {
            vprintln!(verbose, 2, "no content metadata in {:?}, skipping", package_dir);
            continue;
        }

        let content_id = entry.file_name().to_string_lossy().to_lowercase();
        let relative = relative_to_root(&package_dir, root);
        let event = if !title.is_known_content(&content_id) {
            ClassificationEvent::new(EventKind::ContentUnknown, title_id, relative)
        } else if let Some(archive) = title.archive_name(&content_id) {
            ClassificationEvent::new(EventKind::ContentArchived, title_id, relative)
                .with_detail(archive)
        } else {
            ClassificationEvent::new(EventKind::ContentUnarchived, title_id, relative)
        };
        sink.emit(&event.with_title_name(&title.title_name));
    }

    Ok(())
}

fn has_content_meta(package_dir: &Path) -> Result<bool, ScanError> {
    for entry in sorted_entries(package_dir)? {
        let file_type = entry
            .file_type()
            .map_err(|e| ScanError::listing(package_dir, e))?;
        if file_type.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if name.contains(CONTENT_META_MARKER) {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::Recorder;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn directory_named_like_metadata_does_not_qualify() {
        let dir = tempdir().unwrap();
        let package = dir.path().join("dlc0001");
        fs::create_dir_all(package.join("ContentMeta.xbx")).unwrap();

        assert!(!has_content_meta(&package).unwrap());
    }

    #[test]
    fn metadata_match_is_case_insensitive_substring() {
        let dir = tempdir().unwrap();
        let package = dir.path().join("dlc0001");
        fs::create_dir_all(&package).unwrap();
        fs::write(package.join("0_CONTENTMETA.XBX.bak"), b"meta").unwrap();

        assert!(has_content_meta(&package).unwrap());
    }

    #[test]
    fn loose_files_under_content_dir_are_ignored() {
        let dir = tempdir().unwrap();
        let content_dir = dir.path().join("4d530064").join("$c");
        fs::create_dir_all(&content_dir).unwrap();
        fs::write(content_dir.join("contentmeta.xbx"), b"meta").unwrap();

        let title = TitleData::new("Game A");
        let mut recorder = Recorder::default();
        classify_content(&content_dir, &title, "4d530064", dir.path(), 0, &mut recorder)
            .unwrap();
        assert!(recorder.events.is_empty());
    }

    #[test]
    fn content_id_is_lowercased_before_lookup() {
        let dir = tempdir().unwrap();
        let content_dir = dir.path().join("4d530064").join("$c");
        let package = content_dir.join("DLC0001");
        fs::create_dir_all(&package).unwrap();
        fs::write(package.join("contentmeta.xbx"), b"meta").unwrap();

        let title = TitleData::new("Game A").with_content_id("dlc0001");
        let mut recorder = Recorder::default();
        classify_content(&content_dir, &title, "4d530064", dir.path(), 0, &mut recorder)
            .unwrap();

        assert_eq!(recorder.events.len(), 1);
        let event = &recorder.events[0];
        assert_eq!(event.kind, EventKind::ContentUnarchived);
        assert_eq!(event.title_name.as_deref(), Some("Game A"));
        assert_eq!(
            event.path,
            Path::new("4d530064").join("$c").join("DLC0001")
        );
    }
}
