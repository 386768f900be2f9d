//! Where classification events go once the walker has decided on them.
//!
//! Renderers only decide how an event looks. What an event says lives in
//! [`describe`] and [`tone`] so the console and the text pane never disagree.

use std::collections::{BTreeMap, HashSet};
use std::io::Write;

use owo_colors::OwoColorize;
use serde::Serialize;

use crate::types::{ClassificationEvent, EventKind};
use crate::verify::CONTENT_DIR;

pub trait EventSink {
    /// Called once per recognized title, before any of its events.
    fn header(&mut self, title_id: &str, title_name: &str);
    fn emit(&mut self, event: &ClassificationEvent);
}

impl<'a> EventSink for Vec<&'a mut dyn EventSink> {
    fn header(&mut self, title_id: &str, title_name: &str) {
        for sink in self.iter_mut() {
            sink.header(title_id, title_name);
        }
    }

    fn emit(&mut self, event: &ClassificationEvent) {
        for sink in self.iter_mut() {
            sink.emit(event);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tone {
    Good,
    Warning,
    Bad,
}

pub fn tone(kind: EventKind) -> Tone {
    match kind {
        EventKind::ContentArchived | EventKind::UpdateKnown => Tone::Good,
        EventKind::UnknownTitleDir | EventKind::ContentUnarchived => Tone::Warning,
        EventKind::ContentUnknown | EventKind::UpdateUnknown | EventKind::HashError => Tone::Bad,
    }
}

/// Human readable lines for one event, first line is the headline.
pub fn describe(event: &ClassificationEvent) -> Vec<String> {
    let path = event.path.display();
    let title = event.title_name.as_deref().unwrap_or("unknown title");
    let detail = event.detail.as_deref().unwrap_or_default();
    let sha1 = event.sha1.as_deref().unwrap_or_default();

    match event.kind {
        EventKind::UnknownTitleDir if detail == CONTENT_DIR => {
            vec![format!("DLC content found in unrecognized directory: {path}")]
        }
        EventKind::UnknownTitleDir => {
            vec![format!("Updates found in unrecognized directory: {path}")]
        }
        EventKind::ContentUnknown => vec![format!("Unknown content found at: {path}")],
        EventKind::ContentArchived => {
            vec![format!("Content is known and archived {detail}: {path}")]
        }
        EventKind::ContentUnarchived => {
            vec![format!("{title} has unarchived content found at: {path}")]
        }
        EventKind::UpdateKnown => vec![
            format!(
                "Known and archived title update found for {title} ({}) ({detail})",
                event.title_id
            ),
            format!("Path: {path}"),
            format!("SHA1: {sha1}"),
        ],
        EventKind::UpdateUnknown => vec![
            format!("Unknown title update found for {title} ({})", event.title_id),
            format!("Path: {path}"),
            format!("SHA1: {sha1}"),
        ],
        EventKind::HashError => {
            vec![format!("Error calculating hash for file: {path}, error: {detail}")]
        }
    }
}

fn header_text(title_id: &str, title_name: &str) -> String {
    format!("== {title_name} ({title_id}) ==")
}

/// Colored terminal output.
pub struct ConsoleSink<W: Write> {
    out: W,
    color: bool,
}

impl ConsoleSink<std::io::Stdout> {
    pub fn stdout(color: bool) -> Self {
        Self::new(std::io::stdout(), color)
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, text: &str, tone: Tone) -> String {
        if !self.color {
            return text.to_string();
        }
        match tone {
            Tone::Good => text.green().to_string(),
            Tone::Warning => text.yellow().to_string(),
            Tone::Bad => text.red().to_string(),
        }
    }
}

impl<W: Write> EventSink for ConsoleSink<W> {
    fn header(&mut self, title_id: &str, title_name: &str) {
        let text = header_text(title_id, title_name);
        let line = if self.color {
            text.cyan().bold().to_string()
        } else {
            text
        };
        let _ = writeln!(self.out, "{line}");
    }

    fn emit(&mut self, event: &ClassificationEvent) {
        let tone = tone(event.kind);
        for line in describe(event) {
            let painted = self.paint(&line, tone);
            let _ = writeln!(self.out, "{painted}");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaneLine {
    pub tone: Option<Tone>,
    pub text: String,
    pub header: bool,
}

/// Buffer of styled lines for a GUI text panel. The panel draws them as-is.
#[derive(Debug, Default)]
pub struct PaneSink {
    lines: Vec<PaneLine>,
}

impl PaneSink {
    pub fn lines(&self) -> &[PaneLine] {
        &self.lines
    }

    pub fn to_plain_text(&self) -> String {
        let mut text = String::new();
        for line in &self.lines {
            text.push_str(&line.text);
            text.push('\n');
        }
        text
    }
}

impl EventSink for PaneSink {
    fn header(&mut self, title_id: &str, title_name: &str) {
        self.lines.push(PaneLine {
            tone: None,
            text: header_text(title_id, title_name),
            header: true,
        });
    }

    fn emit(&mut self, event: &ClassificationEvent) {
        let tone = tone(event.kind);
        self.lines.extend(describe(event).into_iter().map(|text| PaneLine {
            tone: Some(tone),
            text,
            header: false,
        }));
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum JsonRecord<'a> {
    Header {
        title_id: &'a str,
        title_name: &'a str,
    },
    Event(&'a ClassificationEvent),
}

/// One JSON object per line.
pub struct JsonSink<W: Write> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, record: &JsonRecord<'_>) {
        if let Ok(line) = serde_json::to_string(record) {
            let _ = writeln!(self.out, "{line}");
        }
    }
}

impl<W: Write> EventSink for JsonSink<W> {
    fn header(&mut self, title_id: &str, title_name: &str) {
        self.write(&JsonRecord::Header {
            title_id,
            title_name,
        });
    }

    fn emit(&mut self, event: &ClassificationEvent) {
        self.write(&JsonRecord::Event(event));
    }
}

/// Keeps everything it is sent. Handy for callers that post-process a scan.
#[derive(Debug, Default)]
pub struct Recorder {
    pub headers: Vec<(String, String)>,
    pub events: Vec<ClassificationEvent>,
}

impl EventSink for Recorder {
    fn header(&mut self, title_id: &str, title_name: &str) {
        self.headers
            .push((title_id.to_string(), title_name.to_string()));
    }

    fn emit(&mut self, event: &ClassificationEvent) {
        self.events.push(event.clone());
    }
}

/// Drops output for ignored titles, or for everything but one title.
pub struct TitleFilter<S> {
    inner: S,
    only: Option<String>,
    ignored: HashSet<String>,
}

impl<S: EventSink> TitleFilter<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            only: None,
            ignored: HashSet::new(),
        }
    }

    pub fn only(mut self, title_id: Option<&str>) -> Self {
        self.only = title_id.map(str::to_lowercase);
        self
    }

    pub fn ignoring<I: IntoIterator<Item = String>>(mut self, title_ids: I) -> Self {
        self.ignored
            .extend(title_ids.into_iter().map(|id| id.to_lowercase()));
        self
    }

    pub fn allows(&self, title_id: &str) -> bool {
        if self.ignored.contains(title_id) {
            return false;
        }
        self.only.as_deref().is_none_or(|only| only == title_id)
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: EventSink> EventSink for TitleFilter<S> {
    fn header(&mut self, title_id: &str, title_name: &str) {
        if self.allows(title_id) {
            self.inner.header(title_id, title_name);
        }
    }

    fn emit(&mut self, event: &ClassificationEvent) {
        if self.allows(&event.title_id) {
            self.inner.emit(event);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanTally {
    pub titles: usize,
    pub by_kind: BTreeMap<EventKind, usize>,
}

impl ScanTally {
    pub fn count(&self, kind: EventKind) -> usize {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_events(&self) -> usize {
        self.by_kind.values().sum()
    }
}

/// Counts what passes through on the way to `inner`.
pub struct Tally<S> {
    inner: S,
    tally: ScanTally,
}

impl<S: EventSink> Tally<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            tally: ScanTally::default(),
        }
    }

    pub fn into_parts(self) -> (S, ScanTally) {
        (self.inner, self.tally)
    }
}

impl<S: EventSink> EventSink for Tally<S> {
    fn header(&mut self, title_id: &str, title_name: &str) {
        self.tally.titles += 1;
        self.inner.header(title_id, title_name);
    }

    fn emit(&mut self, event: &ClassificationEvent) {
        *self.tally.by_kind.entry(event.kind).or_insert(0) += 1;
        self.inner.emit(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn known_update() -> ClassificationEvent {
        ClassificationEvent::new(
            EventKind::UpdateKnown,
            "4d530064",
            PathBuf::from("4d530064/$u/default.xbe"),
        )
        .with_title_name("Game A")
        .with_detail("Update 1.0")
        .with_sha1("a9993e364706816aba3e25717850c26c9cd0d89d")
    }

    fn unknown_dir(sub: &str) -> ClassificationEvent {
        ClassificationEvent::new(
            EventKind::UnknownTitleDir,
            "zzzzzzzz",
            PathBuf::from("zzzzzzzz").join(sub),
        )
        .with_detail(sub)
    }

    #[test]
    fn update_description_carries_name_path_and_digest() {
        let lines = describe(&known_update());
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Game A"));
        assert!(lines[0].contains("Update 1.0"));
        assert!(lines[1].ends_with("default.xbe"));
        assert_eq!(lines[2], "SHA1: a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn unrecognized_directory_wording_follows_subdir() {
        assert!(describe(&unknown_dir("$c"))[0].starts_with("DLC content"));
        assert!(describe(&unknown_dir("$u"))[0].starts_with("Updates"));
    }

    #[test]
    fn console_without_color_writes_plain_lines() {
        let mut sink = ConsoleSink::new(Vec::new(), false);
        sink.header("4d530064", "Game A");
        sink.emit(&known_update());
        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "== Game A (4d530064) ==");
        assert_eq!(lines.len(), 4);
        assert!(!out.contains('\u{1b}'));
    }

    #[test]
    fn console_with_color_emits_escape_codes() {
        let mut sink = ConsoleSink::new(Vec::new(), true);
        sink.emit(&known_update());
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert!(out.contains('\u{1b}'));
    }

    #[test]
    fn pane_and_console_say_the_same_thing() {
        let mut pane = PaneSink::default();
        let mut console = ConsoleSink::new(Vec::new(), false);
        for sink in [&mut pane as &mut dyn EventSink, &mut console] {
            sink.header("4d530064", "Game A");
            sink.emit(&known_update());
        }
        let console_text = String::from_utf8(console.into_inner()).unwrap();
        assert_eq!(pane.to_plain_text(), console_text);
        assert!(pane.lines()[0].header);
        assert_eq!(pane.lines()[1].tone, Some(Tone::Good));
    }

    #[test]
    fn json_lines_are_tagged() {
        let mut sink = JsonSink::new(Vec::new());
        sink.header("4d530064", "Game A");
        sink.emit(&known_update());
        let out = String::from_utf8(sink.into_inner()).unwrap();
        let records: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(records[0]["type"], "header");
        assert_eq!(records[1]["type"], "event");
        assert_eq!(records[1]["kind"], "update_known");
        assert_eq!(records[1]["detail"], "Update 1.0");
    }

    #[test]
    fn filter_drops_ignored_and_other_titles() {
        let mut filter = TitleFilter::new(Recorder::default())
            .ignoring(vec!["ZZZZZZZZ".to_string()]);
        filter.emit(&unknown_dir("$u"));
        filter.emit(&known_update());
        assert_eq!(filter.into_inner().events.len(), 1);

        let mut only = TitleFilter::new(Recorder::default()).only(Some("41560017"));
        only.header("4d530064", "Game A");
        only.emit(&known_update());
        let recorded = only.into_inner();
        assert!(recorded.headers.is_empty());
        assert!(recorded.events.is_empty());
    }

    #[test]
    fn tally_counts_by_kind() {
        let mut tally = Tally::new(Recorder::default());
        tally.header("4d530064", "Game A");
        tally.emit(&known_update());
        tally.emit(&known_update());
        tally.emit(&unknown_dir("$c"));
        let (recorder, counts) = tally.into_parts();
        assert_eq!(recorder.events.len(), 3);
        assert_eq!(counts.titles, 1);
        assert_eq!(counts.count(EventKind::UpdateKnown), 2);
        assert_eq!(counts.count(EventKind::UnknownTitleDir), 1);
        assert_eq!(counts.count(EventKind::HashError), 0);
        assert_eq!(counts.total_events(), 3);
    }

    #[test]
    fn fan_out_reaches_every_sink() {
        let mut first = Recorder::default();
        let mut second = PaneSink::default();
        {
            let mut outputs: Vec<&mut dyn EventSink> =
                vec![&mut first as &mut dyn EventSink, &mut second];
            outputs.header("4d530064", "Game A");
            outputs.emit(&known_update());
        }
        assert_eq!(first.events.len(), 1);
        assert_eq!(second.lines().len(), 4);
    }
}
