use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use reqwest::blocking::Client;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use tempfile::NamedTempFile;

/// Catalog record for a single title. Every identifier and digest held here is lowercase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleData {
    pub title_name: String,
    pub content_ids: HashSet<String>,
    /// content id -> name of the archive set it was preserved in
    pub archived: HashMap<String, String>,
    /// sha1 hex -> update display name
    pub title_updates_known: HashMap<String, String>,
}

impl TitleData {
    pub fn new(title_name: impl Into<String>) -> Self {
        Self {
            title_name: title_name.into(),
            ..Self::default()
        }
    }

    pub fn with_content_id(mut self, content_id: &str) -> Self {
        self.content_ids.insert(content_id.to_lowercase());
        self
    }

    pub fn with_archived(mut self, content_id: &str, archive: &str) -> Self {
        self.archived
            .insert(content_id.to_lowercase(), archive.to_string());
        self
    }

    pub fn with_known_update(mut self, sha1: &str, name: &str) -> Self {
        self.title_updates_known
            .insert(sha1.to_lowercase(), name.to_string());
        self
    }

    pub fn is_known_content(&self, content_id: &str) -> bool {
        self.content_ids.contains(content_id)
    }

    pub fn archive_name(&self, content_id: &str) -> Option<&str> {
        self.archived.get(content_id).map(String::as_str)
    }

    pub fn known_update(&self, sha1: &str) -> Option<&str> {
        self.title_updates_known.get(sha1).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    titles: HashMap<String, TitleData>,
    /// Ids dropped at load because an earlier id differing only in case won.
    duplicates: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct CatalogStats {
    pub titles: usize,
    pub content_ids: usize,
    pub archived: usize,
    pub known_updates: usize,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, title_id: &str, data: TitleData) {
        self.titles.insert(title_id.to_lowercase(), data);
    }

    /// Look up a title; the id is lowercased first so directory case never matters.
    pub fn get(&self, title_id: &str) -> Option<&TitleData> {
        self.titles.get(&title_id.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn duplicate_ids(&self) -> &[String] {
        &self.duplicates
    }

    pub fn stats(&self) -> CatalogStats {
        self.titles
            .values()
            .fold(CatalogStats::default(), |mut acc, title| {
                acc.titles += 1;
                acc.content_ids += title.content_ids.len();
                acc.archived += title.archived.len();
                acc.known_updates += title.title_updates_known.len();
                acc
            })
    }

    /// Parse catalog JSON. Comments are stripped before parsing.
    ///
    /// When two ids differ only in case the first one in the document is kept
    /// and the later ones are listed by [`Catalog::duplicate_ids`].
    pub fn from_json_str(input: &str) -> anyhow::Result<Self> {
        let cleaned = strip_json_comments(input);
        let raw: RawCatalog = serde_json::from_str(&cleaned).context("parsing catalog JSON")?;

        let mut catalog = Catalog::new();
        for (title_id, entry) in raw.titles.0 {
            let key = title_id.to_lowercase();
            if catalog.titles.contains_key(&key) {
                catalog.duplicates.push(title_id);
                continue;
            }
            catalog.titles.insert(key, entry.into_title_data());
        }
        Ok(catalog)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("reading catalog {path:?}"))?;
        Self::from_json_str(&text).with_context(|| format!("loading catalog {path:?}"))
    }
}

impl FromIterator<(String, TitleData)> for Catalog {
    fn from_iter<I: IntoIterator<Item = (String, TitleData)>>(iter: I) -> Self {
        let mut catalog = Catalog::new();
        for (title_id, data) in iter {
            catalog.insert(&title_id, data);
        }
        catalog
    }
}

#[derive(Deserialize)]
struct RawCatalog {
    #[serde(rename = "Titles")]
    titles: OrderedTitles,
}

/// Title records in document order, so duplicate handling does not depend on hashing.
struct OrderedTitles(Vec<(String, RawTitle)>);

impl<'de> Deserialize<'de> for OrderedTitles {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TitlesVisitor;

        impl<'de> Visitor<'de> for TitlesVisitor {
            type Value = OrderedTitles;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of title records keyed by title id")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut titles = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, RawTitle>()? {
                    titles.push(entry);
                }
                Ok(OrderedTitles(titles))
            }
        }

        deserializer.deserialize_map(TitlesVisitor)
    }
}

#[derive(Deserialize)]
struct RawTitle {
    #[serde(rename = "Title Name", alias = "TitleName", default)]
    title_name: Option<String>,
    #[serde(rename = "Content IDs", alias = "ContentIDs", default)]
    content_ids: Option<Vec<String>>,
    #[serde(rename = "Archived", default)]
    archived: Option<NameTable>,
    #[serde(
        rename = "Title Updates Known",
        alias = "TitleUpdatesKnown",
        default
    )]
    title_updates_known: Option<NameTable>,
}

/// Older catalogs store these tables as a list of single-entry objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum NameTable {
    Map(HashMap<String, String>),
    List(Vec<HashMap<String, String>>),
}

impl NameTable {
    fn into_lowercase_map(self) -> HashMap<String, String> {
        let pairs: Vec<(String, String)> = match self {
            NameTable::Map(map) => map.into_iter().collect(),
            NameTable::List(list) => list.into_iter().flatten().collect(),
        };
        pairs
            .into_iter()
            .map(|(key, name)| (key.to_lowercase(), name))
            .collect()
    }
}

impl RawTitle {
    fn into_title_data(self) -> TitleData {
        TitleData {
            title_name: self.title_name.unwrap_or_default(),
            content_ids: self
                .content_ids
                .unwrap_or_default()
                .into_iter()
                .map(|id| id.to_lowercase())
                .collect(),
            archived: self
                .archived
                .map(NameTable::into_lowercase_map)
                .unwrap_or_default(),
            title_updates_known: self
                .title_updates_known
                .map(NameTable::into_lowercase_map)
                .unwrap_or_default(),
        }
    }
}

/// Remove `//` and `/* */` comments outside of string literals.
/// Newlines inside comments are kept so serde_json error positions still line up.
pub fn strip_json_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }

    out
}

pub fn refresh_catalog(
    url: &str,
    dest: &Path,
    timeout: Duration,
    verbose: u8,
) -> anyhow::Result<CatalogStats> {
    let client = Client::builder().timeout(timeout).build()?;
    refresh_catalog_with_client(&client, url, dest, verbose)
}

/// Download a fresh catalog and replace `dest` with it.
///
/// The body has to parse as a catalog before anything on disk is touched, and
/// the swap goes through a temp file in the destination directory so a failed
/// write never leaves a truncated catalog behind.
pub fn refresh_catalog_with_client(
    client: &Client,
    url: &str,
    dest: &Path,
    verbose: u8,
) -> anyhow::Result<CatalogStats> {
    vprintln!(verbose, 1, "downloading catalog from {}", url);
    let response = client
        .get(url)
        .send()
        .with_context(|| format!("requesting catalog from {url}"))?;
    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("catalog download from {url} failed with HTTP {status}");
    }
    let body = response
        .text()
        .with_context(|| format!("reading catalog body from {url}"))?;
    let catalog = Catalog::from_json_str(&body).context("downloaded catalog is not valid")?;
    vprintln!(
        verbose,
        1,
        "downloaded {} bytes, {} titles",
        body.len(),
        catalog.len()
    );

    let dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {dir:?}"))?;
    tmp.write_all(body.as_bytes())?;
    tmp.flush()?;
    tmp.persist(dest)
        .map_err(|e| e.error)
        .with_context(|| format!("replacing catalog {dest:?}"))?;

    Ok(catalog.stats())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"{
        // exported catalog
        "Titles": {
            "4D530064": {
                "Title Name": "Game A",
                "Content IDs": ["DLC0001", "dlc0002"],
                /* historical list shape */
                "Archived": [{"DLC0001": "ArchiveSet7"}],
                "Title Updates Known": {"ABCDEF0123456789ABCDEF0123456789ABCDEF01": "Update 1.0"}
            },
            "41560017": {
                "Title Name": "Path // with /* markers */"
            }
        }
    }"#;

    #[test]
    fn loads_and_canonicalizes_identifiers() {
        let catalog = Catalog::from_json_str(SAMPLE).unwrap();
        assert_eq!(catalog.len(), 2);

        let title = catalog.get("4d530064").unwrap();
        assert_eq!(title.title_name, "Game A");
        assert!(title.is_known_content("dlc0001"));
        assert!(title.is_known_content("dlc0002"));
        assert_eq!(title.archive_name("dlc0001"), Some("ArchiveSet7"));
        assert_eq!(
            title.known_update("abcdef0123456789abcdef0123456789abcdef01"),
            Some("Update 1.0")
        );
    }

    #[test]
    fn lookup_ignores_title_id_case() {
        let catalog = Catalog::from_json_str(SAMPLE).unwrap();
        assert_eq!(catalog.get("4D530064"), catalog.get("4d530064"));
        assert!(catalog.get("4D530064").is_some());
    }

    #[test]
    fn comment_markers_inside_strings_survive() {
        let catalog = Catalog::from_json_str(SAMPLE).unwrap();
        assert_eq!(
            catalog.get("41560017").unwrap().title_name,
            "Path // with /* markers */"
        );
    }

    #[test]
    fn content_membership_is_exact() {
        let title = TitleData::new("Game A").with_content_id("dlc0001");
        assert!(title.is_known_content("dlc0001"));
        assert!(!title.is_known_content("dlc000"));
        assert!(!title.is_known_content("dlc00011"));
    }

    #[test]
    fn strip_keeps_line_numbers() {
        let input = "{\n/* a\nb */\n\"x\": 1 // trailing\n}";
        let stripped = strip_json_comments(input);
        assert_eq!(stripped.lines().count(), input.lines().count());
        let value: serde_json::Value = serde_json::from_str(&stripped).unwrap();
        assert_eq!(value["x"], 1);
    }

    #[test]
    fn escaped_quote_does_not_end_string() {
        let input = r#"{"a": "say \"hi\" // not a comment"}"#;
        assert_eq!(strip_json_comments(input), input);
    }

    #[test]
    fn stats_sum_across_titles() {
        let catalog = Catalog::from_json_str(SAMPLE).unwrap();
        assert_eq!(
            catalog.stats(),
            CatalogStats {
                titles: 2,
                content_ids: 2,
                archived: 1,
                known_updates: 1,
            }
        );
    }

    #[test]
    fn case_variant_ids_keep_the_first_record() {
        let input = r#"{"Titles": {
            "4D530064": {"Title Name": "Game A"},
            "4d530064": {"Title Name": "Game A (alt)"}
        }}"#;
        let catalog = Catalog::from_json_str(input).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("4d530064").unwrap().title_name, "Game A");
        assert_eq!(catalog.duplicate_ids(), ["4d530064".to_string()]);

        let reversed = r#"{"Titles": {
            "4d530064": {"Title Name": "Game A (alt)"},
            "4D530064": {"Title Name": "Game A"}
        }}"#;
        let catalog = Catalog::from_json_str(reversed).unwrap();
        assert_eq!(catalog.get("4d530064").unwrap().title_name, "Game A (alt)");
        assert_eq!(catalog.duplicate_ids(), ["4D530064".to_string()]);
    }

    #[test]
    fn titles_must_be_an_object() {
        assert!(Catalog::from_json_str(r#"{"Titles": ["4d530064"]}"#).is_err());
    }

    #[test]
    fn load_reports_path_on_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("id_database.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = Catalog::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("id_database.json"));
    }
}
