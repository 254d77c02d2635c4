use crate::alignment::{vector_edit_distance, window_edit_distance};
use crate::candidates::{LocatedNGram, Neighborhood, NeighborhoodCollector, Windows};
use crate::symbols::Symbol;
use std::fmt;

/// The single best-aligned offset chosen for a neighborhood.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PromotedLocation {
    pub offset: usize,
    pub distance: f64,
}

impl fmt::Display for PromotedLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PLoc[loc:{},dist:{}]", self.offset, self.distance)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PromotionCollector {
    pub strong: Vec<PromotedLocation>,
    pub elongation: Vec<PromotedLocation>,
    pub alt_ending: Vec<PromotedLocation>,
}

/// Keeps the first location with strictly smaller distance.
#[derive(Default)]
struct Best(Option<PromotedLocation>);

impl Best {
    fn offer(&mut self, offset: usize, distance: f64) {
        match self.0 {
            Some(b) if distance >= b.distance => {}
            _ => self.0 = Some(PromotedLocation { offset, distance }),
        }
    }
}

fn normalized(distance: usize, size: usize) -> f64 {
    if size == 0 { f64::INFINITY } else { distance as f64 / size as f64 }
}

pub fn promote_strong(hood: &Neighborhood, query: &[Symbol], log: &[Symbol]) -> Option<PromotedLocation> {
    let q = query.len();
    let pad = q / 2;
    let start = hood.start.saturating_sub(pad);
    let end = hood.end.saturating_add(pad).min(log.len());
    let mut best = Best::default();
    for i in start..end {
        let d = window_edit_distance(query, log, i, i + q);
        best.offer(i, normalized(d, q));
    }
    best.0
}

/// Groups each member with the later members that start within `elong` of it.
fn member_vectors(members: &[LocatedNGram], elong: usize) -> Vec<&[LocatedNGram]> {
    (0..members.len())
        .map(|i| {
            let limit = members[i].offset.saturating_add(elong);
            let len = members[i..].iter().take_while(|m| m.offset < limit).count();
            &members[i..i + len]
        })
        .collect()
}

pub fn promote_elongation(hood: &Neighborhood, query_len: usize, elong: usize) -> Option<PromotedLocation> {
    let mut members = hood.members.clone();
    members.sort_by_key(|m| m.offset);
    let mut best = Best::default();
    for vector in member_vectors(&members, elong) {
        let d = vector_edit_distance(vector, &members, 0, vector.len(), 0, members.len());
        best.offer(vector[0].offset, normalized(d, query_len));
    }
    best.0
}

/// Looks for truncated occurrences: offsets whose tail does *not* match well
/// but whose head (narrow) or body (wide) does.
pub fn promote_alt_ending(
    hood: &Neighborhood,
    query: &[Symbol],
    log: &[Symbol],
    alt: usize,
    threshold: f64,
) -> Option<PromotedLocation> {
    let q = query.len();
    let pad = alt / 2;
    let start = hood.start.saturating_sub(pad);
    let end = hood.end.saturating_add(pad).min(log.len().saturating_sub(q));
    let wide = q.saturating_sub(alt);
    let mut best = Best::default();
    for i in start..end {
        let narrow_d = normalized(window_edit_distance(query, log, i, i + alt), alt);
        let wide_d = normalized(window_edit_distance(query, log, i, i + wide), wide);
        let end_d = normalized(window_edit_distance(query, log, i + wide, i + q), alt);
        if end_d > threshold {
            best.offer(i, narrow_d.min(wide_d));
        }
    }
    best.0
}

pub fn elect_representatives(
    hoods: &NeighborhoodCollector,
    query: &[Symbol],
    log: &[Symbol],
    windows: &Windows,
    threshold: f64,
) -> PromotionCollector {
    PromotionCollector {
        strong: hoods.strong.iter().filter_map(|h| promote_strong(h, query, log)).collect(),
        elongation: hoods
            .elongation
            .iter()
            .filter_map(|h| promote_elongation(h, query.len(), windows.elongation))
            .collect(),
        alt_ending: hoods
            .alt_ending
            .iter()
            .filter_map(|h| promote_alt_ending(h, query, log, windows.alt_ending, threshold))
            .collect(),
    }
}
