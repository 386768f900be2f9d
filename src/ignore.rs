use std::fs;
use std::path::Path;

use anyhow::Context;

/// Load a JSON array of title ids to leave out of the rendered output.
/// Entries are trimmed and lowercased; blank entries are dropped.
pub fn load_ignore_list(path: &Path) -> anyhow::Result<Vec<String>> {
    let data = fs::read_to_string(path).with_context(|| format!("reading ignore list {path:?}"))?;
    parse_ignore_list(&data).with_context(|| format!("parsing ignore list {path:?}"))
}

pub fn parse_ignore_list(data: &str) -> anyhow::Result<Vec<String>> {
    let entries: Vec<String> = serde_json::from_str(data)?;
    Ok(entries
        .into_iter()
        .map(|entry| entry.trim().to_lowercase())
        .filter(|entry| !entry.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn normalizes_entries() {
        let list = parse_ignore_list(r#"[" 4D530064 ", "", "41560017"]"#).unwrap();
        assert_eq!(list, vec!["4d530064".to_string(), "41560017".to_string()]);
    }

    #[test]
    fn rejects_non_array() {
        assert!(parse_ignore_list(r#"{"Titles": {}}"#).is_err());
    }

    #[test]
    fn missing_file_names_path() {
        let dir = tempdir().unwrap();
        let err = load_ignore_list(&dir.path().join("ignorelist.json")).unwrap_err();
        assert!(format!("{err:#}").contains("ignorelist.json"));
    }
}
