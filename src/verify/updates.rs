use std::path::Path;

use crate::catalog::TitleData;
use crate::checksum::sha1_file;
use crate::sink::EventSink;
use crate::types::{ClassificationEvent, EventKind};

use super::{ScanError, relative_to_root, sorted_entries};

const UPDATE_EXTENSION: &str = "xbe";

/// Hash every `.xbe` file directly under a title's `$u` directory and match it
/// against the title's known update digests.
///
/// Each file is classified on its own: a match never stops the remaining files
/// from being hashed, and a file that cannot be read becomes a `HashError`
/// event instead of aborting the scan.
pub fn classify_updates(
    update_dir: &Path,
    title: &TitleData,
    title_id: &str,
    root: &Path,
    verbose: u8,
    sink: &mut dyn EventSink,
) -> Result<(), ScanError> {
    for entry in sorted_entries(update_dir)? {
        let file_type = entry
            .file_type()
            .map_err(|e| ScanError::listing(update_dir, e))?;
        let path = entry.path();
        if file_type.is_dir() || !is_update_binary(&path) {
            vprintln!(verbose, 2, "ignoring {:?}", path);
            continue;
        }

        let relative = relative_to_root(&path, root);
        let event = match sha1_file(&path) {
            Ok(digest) => match title.known_update(&digest) {
                Some(name) => ClassificationEvent::new(EventKind::UpdateKnown, title_id, relative)
                    .with_detail(name)
                    .with_sha1(digest),
                None => ClassificationEvent::new(EventKind::UpdateUnknown, title_id, relative)
                    .with_sha1(digest),
            },
            // The event path already names the file; keep only the I/O failure.
            Err(err) => ClassificationEvent::new(EventKind::HashError, title_id, relative)
                .with_detail(err.root_cause().to_string()),
        };
        sink.emit(&event.with_title_name(&title.title_name));
    }

    Ok(())
}

fn is_update_binary(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(UPDATE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_lowercase_xbe_extension_counts() {
        assert!(is_update_binary(Path::new("$u/default.xbe")));
        assert!(!is_update_binary(Path::new("$u/default.XBE")));
        assert!(!is_update_binary(Path::new("$u/default.xbe.bak")));
        assert!(!is_update_binary(Path::new("$u/xbe")));
    }
}
