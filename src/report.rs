use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use crate::catalog::{Catalog, CatalogStats, TitleData};
use crate::sink::{PaneSink, ScanTally};
use crate::types::EventKind;

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename = "summary")]
pub struct Summary<'a> {
    pub catalog: CatalogStats,
    pub scan: &'a ScanTally,
}

pub fn summary_lines(stats: &CatalogStats, tally: &ScanTally) -> Vec<String> {
    let mut lines = vec![
        "Catalog".to_string(),
        format!("  titles:          {}", stats.titles),
        format!("  content ids:     {}", stats.content_ids),
        format!("  archived:        {}", stats.archived),
        format!("  known updates:   {}", stats.known_updates),
        "Scan".to_string(),
        format!("  titles found:    {}", tally.titles),
    ];
    for kind in EventKind::ALL {
        lines.push(format!("  {:<28} {}", format!("{kind}:"), tally.count(kind)));
    }
    lines
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename = "title")]
pub struct TitleRecord<'a> {
    pub title_id: &'a str,
    pub record: Option<TitleView<'a>>,
}

/// Sorted view of a catalog record, for stable output.
#[derive(Debug, Serialize)]
pub struct TitleView<'a> {
    pub title_name: &'a str,
    pub content_ids: Vec<&'a str>,
    pub archived: BTreeMap<&'a str, &'a str>,
    pub title_updates_known: BTreeMap<&'a str, &'a str>,
}

impl<'a> From<&'a TitleData> for TitleView<'a> {
    fn from(title: &'a TitleData) -> Self {
        let mut content_ids: Vec<&str> = title.content_ids.iter().map(String::as_str).collect();
        content_ids.sort_unstable();
        Self {
            title_name: &title.title_name,
            content_ids,
            archived: title
                .archived
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect(),
            title_updates_known: title
                .title_updates_known
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect(),
        }
    }
}

pub fn title_record<'a>(catalog: &'a Catalog, title_id: &'a str) -> TitleRecord<'a> {
    TitleRecord {
        title_id,
        record: catalog.get(title_id).map(TitleView::from),
    }
}

pub fn title_lines(record: &TitleRecord<'_>) -> Vec<String> {
    let Some(view) = &record.record else {
        return vec![format!("Title {} is not in the catalog", record.title_id)];
    };

    let mut lines = vec![format!("Title {}: {}", record.title_id, view.title_name)];
    if view.content_ids.is_empty() {
        lines.push("  no known content".to_string());
    } else {
        lines.push(format!("  content ids: {}", view.content_ids.join(", ")));
    }
    for (content_id, archive) in &view.archived {
        lines.push(format!("  archived: {content_id} -> {archive}"));
    }
    for (sha1, name) in &view.title_updates_known {
        lines.push(format!("  known update: {name} ({sha1})"));
    }
    lines
}

/// Write the captured text pane to disk with a short preamble.
pub fn write_report(path: &Path, root: &Path, pane: &PaneSink) -> anyhow::Result<()> {
    let mut text = format!(
        "Pinecone report for {}\nGenerated {}\n\n",
        root.display(),
        chrono::Local::now().to_rfc3339()
    );
    text.push_str(&pane.to_plain_text());
    fs::write(path, text).with_context(|| format!("writing report {path:?}"))
}
