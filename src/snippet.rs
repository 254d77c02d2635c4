use crate::event::{Event, EventSource};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

pub type SnippetId = String;

/// An ordered, append-only run of events plus where it came from.
#[derive(Debug, Clone, Default)]
pub struct Snippet {
    id: SnippetId,
    source_filename: String,
    user_id: String,
    events: Vec<Event>,
}

impl Snippet {
    pub fn new(id: impl Into<SnippetId>, events: Vec<Event>) -> Self {
        let user_id = events.first().map(|e| e.user_id.clone()).unwrap_or_default();
        Self { id: id.into(), source_filename: String::new(), user_id, events }
    }

    /// Builds a snippet whose id is derived from its source, user and start time.
    pub fn from_source(source_filename: &str, events: Vec<Event>) -> Self {
        let user_id = events.first().map(|e| e.user_id.clone()).unwrap_or_default();
        let start = events.first().map(|e| e.timestamp()).unwrap_or(0);
        let id = format!("{source_filename}-{user_id}-{start}");
        Self { id, source_filename: source_filename.to_string(), user_id, events }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source_filename(&self) -> &str {
        &self.source_filename
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn push(&mut self, event: Event) {
        if self.events.is_empty() && self.user_id.is_empty() {
            self.user_id = event.user_id.clone();
        }
        self.events.push(event);
    }

    /// Wall-clock time of the first event, read as milliseconds since the epoch.
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        let first = self.events.first()?;
        Utc.timestamp_millis_opt(first.timestamp()).single()
    }

    pub fn display_events(&self) -> Vec<String> {
        self.events.iter().map(|e| e.display_title()).collect()
    }
}

impl fmt::Display for Snippet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Snippet[{}, events:{}]", self.id, self.events.len())
    }
}

/// A scored half-open range `[start, end)` into a parent snippet.
#[derive(Debug, Clone, Serialize)]
pub struct SubSequence {
    start: usize,
    end: usize,
    distance: f64,
    #[serde(rename = "snippet", serialize_with = "serialize_snippet_id")]
    snippet: Arc<Snippet>,
}

fn serialize_snippet_id<S: Serializer>(snippet: &Arc<Snippet>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(snippet.id())
}

impl SubSequence {
    pub fn new(start: usize, end: usize, snippet: Arc<Snippet>, distance: f64) -> Self {
        let end = end.min(snippet.len());
        let start = start.min(end);
        Self { start, end, distance, snippet }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn snippet(&self) -> &Arc<Snippet> {
        &self.snippet
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn events(&self) -> &[Event] {
        &self.snippet.events()[self.start..self.end]
    }

    pub fn overlaps(&self, other: &SubSequence) -> bool {
        self.snippet.id() == other.snippet.id()
            && other.start >= self.start
            && other.start < self.end
    }

    /// Copies the covered events into a standalone snippet.
    pub fn sub_snippet(&self) -> Snippet {
        let mut sub = Snippet::from_source(self.snippet.source_filename(), self.events().to_vec());
        sub.id = format!("{}[{}..{}]", self.snippet.id(), self.start, self.end);
        sub
    }

    pub fn cmp_distance(&self, other: &SubSequence) -> Ordering {
        self.distance.total_cmp(&other.distance)
    }
}

impl fmt::Display for SubSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "subS:{}-{},dist:{:.2},source:{}",
            self.start,
            self.end,
            self.distance,
            self.snippet.source_filename()
        )
    }
}
