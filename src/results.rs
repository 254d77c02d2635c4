use crate::candidates::Windows;
use crate::promotion::{PromotedLocation, PromotionCollector};
use crate::snippet::{Snippet, SubSequence};
use itertools::Itertools;
use serde::{Serialize, Serializer};
use std::sync::Arc;

pub const MAX_RESULTS_TO_FILTER: usize = 10_000;

fn serialize_query_id<S: Serializer>(query: &Arc<Snippet>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(query.id())
}

/// Ordered matches for one source query.
#[derive(Debug, Clone, Serialize)]
pub struct ResultSet {
    #[serde(serialize_with = "serialize_query_id")]
    query: Arc<Snippet>,
    results: Vec<SubSequence>,
}

impl ResultSet {
    pub fn new(query: Arc<Snippet>) -> Self {
        Self { query, results: Vec::new() }
    }

    pub fn from_results(results: Vec<SubSequence>, query: Arc<Snippet>) -> Self {
        Self { query, results }
    }

    pub fn query(&self) -> &Arc<Snippet> {
        &self.query
    }

    pub fn results(&self) -> &[SubSequence] {
        &self.results
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SubSequence> {
        self.results.iter()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn push(&mut self, sub: SubSequence) {
        self.results.push(sub);
    }

    /// Stable sort, lowest distance first.
    pub fn rank(&mut self) {
        self.results.sort_by(|a, b| a.cmp_distance(b));
    }

    pub fn merge(&mut self, other: ResultSet) {
        self.results.extend(other.results);
    }

    /// Narrows the ranked results for presentation.
    pub fn filter(&mut self, spec: &FilterSpec) -> FilteredResultSet {
        self.rank();
        let mut results: Vec<SubSequence> = self
            .results
            .iter()
            .take(MAX_RESULTS_TO_FILTER)
            .filter(|s| spec.accepts(s))
            .cloned()
            .collect();
        if let Some(limit) = spec.limit {
            results.truncate(limit);
        }
        FilteredResultSet { query: self.query.clone(), spec: spec.clone(), results }
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a SubSequence;
    type IntoIter = std::slice::Iter<'a, SubSequence>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// Presentation-side narrowing of a result set. Empty lists accept everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub max_distance: Option<f64>,
    pub user_ids: Vec<String>,
    pub sources: Vec<String>,
    pub limit: Option<usize>,
}

impl FilterSpec {
    pub fn accepts(&self, sub: &SubSequence) -> bool {
        if let Some(max) = self.max_distance {
            if sub.distance() > max {
                return false;
            }
        }
        let snip = sub.snippet();
        if !self.user_ids.is_empty() && !self.user_ids.iter().any(|u| u == snip.user_id()) {
            return false;
        }
        if !self.sources.is_empty() && !self.sources.iter().any(|s| s == snip.source_filename()) {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FilteredResultSet {
    #[serde(serialize_with = "serialize_query_id")]
    query: Arc<Snippet>,
    #[serde(skip)]
    spec: FilterSpec,
    results: Vec<SubSequence>,
}

impl FilteredResultSet {
    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    pub fn results(&self) -> &[SubSequence] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// All four match categories for one query.
#[derive(Debug, Clone, Serialize)]
pub struct UberResultSet {
    #[serde(serialize_with = "serialize_query_id")]
    query: Arc<Snippet>,
    pub strong_matches: ResultSet,
    pub weak_matches: ResultSet,
    pub elongated_matches: ResultSet,
    pub alt_ending_matches: ResultSet,
}

impl UberResultSet {
    pub fn new(query: Arc<Snippet>) -> Self {
        Self {
            strong_matches: ResultSet::new(query.clone()),
            weak_matches: ResultSet::new(query.clone()),
            elongated_matches: ResultSet::new(query.clone()),
            alt_ending_matches: ResultSet::new(query.clone()),
            query,
        }
    }

    pub fn query(&self) -> &Arc<Snippet> {
        &self.query
    }

    pub fn merge(&mut self, other: UberResultSet) {
        self.strong_matches.merge(other.strong_matches);
        self.weak_matches.merge(other.weak_matches);
        self.elongated_matches.merge(other.elongated_matches);
        self.alt_ending_matches.merge(other.alt_ending_matches);
    }

    pub fn rank_all(&mut self) {
        self.strong_matches.rank();
        self.weak_matches.rank();
        self.elongated_matches.rank();
        self.alt_ending_matches.rank();
    }

    pub fn total(&self) -> usize {
        self.strong_matches.len()
            + self.weak_matches.len()
            + self.elongated_matches.len()
            + self.alt_ending_matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

fn to_subsequence(p: &PromotedLocation, size: usize, log: &Arc<Snippet>) -> SubSequence {
    SubSequence::new(p.offset, p.offset.saturating_add(size).min(log.len()), log.clone(), p.distance)
}

/// Turns one log's promotions into scored result sets.
///
/// Strong promotions above `threshold` are demoted to weak matches; the other
/// categories drop them.
pub fn admit_results(
    promotions: &PromotionCollector,
    query: &Arc<Snippet>,
    log: &Arc<Snippet>,
    windows: &Windows,
    threshold: f64,
) -> UberResultSet {
    let mut urs = UberResultSet::new(query.clone());

    for p in &promotions.strong {
        let sub = to_subsequence(p, windows.query_len, log);
        if p.distance <= threshold {
            urs.strong_matches.push(sub);
        } else {
            urs.weak_matches.push(sub);
        }
    }
    for p in promotions.elongation.iter().filter(|p| p.distance <= threshold) {
        urs.elongated_matches.push(to_subsequence(p, windows.elongation, log));
    }
    for p in promotions.alt_ending.iter().filter(|p| p.distance <= threshold) {
        urs.alt_ending_matches.push(to_subsequence(p, windows.query_len, log));
    }

    urs.rank_all();
    urs
}

/// Collapses overlapping strong matches from the same log to their best member.
///
/// Returns how many matches were removed.
pub fn prune_strong_matches(set: &mut ResultSet) -> usize {
    let before = set.results.len();
    let sorted = std::mem::take(&mut set.results)
        .into_iter()
        .sorted_by(|a, b| a.snippet().id().cmp(b.snippet().id()).then(a.start().cmp(&b.start())));

    let mut kept: Vec<SubSequence> = Vec::with_capacity(sorted.len());
    // (best member so far, span covered by the whole cluster)
    let mut cluster: Option<(SubSequence, SubSequence)> = None;
    for sub in sorted {
        match cluster.as_mut() {
            Some((best, span)) if span.overlaps(&sub) => {
                if sub.end() > span.end() {
                    *span = SubSequence::new(span.start(), sub.end(), sub.snippet().clone(), 0.0);
                }
                if sub.distance() < best.distance() {
                    *best = sub;
                }
            }
            _ => {
                if let Some((best, _)) = cluster.take() {
                    kept.push(best);
                }
                let span = sub.clone();
                cluster = Some((sub, span));
            }
        }
    }
    if let Some((best, _)) = cluster {
        kept.push(best);
    }

    set.results = kept;
    set.rank();
    before - set.results.len()
}
