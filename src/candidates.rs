use crate::config::MatchConfig;
use crate::ngram::NGramTable;
use std::fmt;

/// An occurrence in a log of an n-gram that also occurs in the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedNGram {
    pub key: String,
    pub offset: usize,
    pub length: usize,
}

impl LocatedNGram {
    /// First offset past the n-gram.
    pub fn end(&self) -> usize {
        self.offset.saturating_add(self.length)
    }
}

/// Window sizes derived from the query length and the match parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Windows {
    pub query_len: usize,
    pub strong: usize,
    pub elongation: usize,
    /// Forward scan width for alt-ending density (one wider than `alt_ending`).
    pub alt_ending_scan: usize,
    pub alt_ending: usize,
}

impl Windows {
    pub fn new(query_len: usize, cfg: &MatchConfig) -> Self {
        let alt_ending = (query_len as f64 * cfg.fraction_to_match).ceil() as usize;
        Self {
            query_len,
            strong: query_len,
            elongation: query_len.saturating_mul(cfg.elongation_factor),
            alt_ending_scan: alt_ending + 1,
            alt_ending,
        }
    }

    fn widest_scan(&self) -> usize {
        self.strong.max(self.elongation).max(self.alt_ending_scan)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub ngram: LocatedNGram,
    pub density: f64,
    pub window: usize,
}

#[derive(Debug, Clone, Default)]
pub struct CandidateCollector {
    pub strong: Vec<Candidate>,
    pub elongation: Vec<Candidate>,
    pub alt_ending: Vec<Candidate>,
}

impl CandidateCollector {
    pub fn is_empty(&self) -> bool {
        self.strong.is_empty() && self.elongation.is_empty() && self.alt_ending.is_empty()
    }
}

impl fmt::Display for CandidateCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let offs = |v: &[Candidate]| v.iter().map(|c| c.ngram.offset).collect::<Vec<_>>();
        write!(
            f,
            "candidates strong:{:?} elong:{:?} altEnd:{:?}",
            offs(&self.strong),
            offs(&self.elongation),
            offs(&self.alt_ending)
        )
    }
}

/// Every log occurrence of every query n-gram, sorted by offset.
pub fn locate_ngrams(query: &NGramTable, log: &NGramTable, n: usize) -> Vec<LocatedNGram> {
    let mut located: Vec<LocatedNGram> = query
        .keys()
        .filter_map(|key| log.get(key).map(|offsets| (key, offsets)))
        .flat_map(|(key, offsets)| {
            offsets.iter().map(move |&offset| LocatedNGram { key: key.clone(), offset, length: n })
        })
        .collect();
    located.sort_by_key(|l| l.offset);
    located
}

/// Number of n-gram start positions that fit entirely inside a window.
fn positions_in_window(window: usize, n: usize) -> usize {
    if window < n { 0 } else { window - n + 1 }
}

/// Pivot plus forward n-grams lying entirely inside the window, over the
/// `W - n + 1` start positions the window holds.
fn density(count: usize, window: usize, n: usize) -> f64 {
    let positions = positions_in_window(window, n);
    if positions == 0 { 0.0 } else { count as f64 / positions as f64 }
}

/// Qualifies each located n-gram as a pivot for zero or more match shapes.
///
/// `located` must be sorted ascending by offset.
pub fn extract_candidates(located: &[LocatedNGram], windows: &Windows, min_density: f64) -> CandidateCollector {
    let mut collector = CandidateCollector::default();
    let widest = windows.widest_scan();

    for (i, pivot) in located.iter().enumerate() {
        let n = pivot.length;
        let p = pivot.offset;
        let fits = |window: usize, lng: &LocatedNGram| lng.end() <= p.saturating_add(window);

        let mut strong = usize::from(fits(windows.strong, pivot));
        let mut elong = usize::from(fits(windows.elongation, pivot));
        let mut alt = usize::from(fits(windows.alt_ending_scan, pivot));

        for other in &located[i + 1..] {
            if !fits(widest, other) {
                break;
            }
            strong += usize::from(fits(windows.strong, other));
            elong += usize::from(fits(windows.elongation, other));
            alt += usize::from(fits(windows.alt_ending_scan, other));
        }

        let strong_density = density(strong, windows.strong, n);
        let elong_density = density(elong, windows.elongation, n);
        let alt_density = density(alt, windows.alt_ending_scan, n);

        if strong_density >= min_density {
            collector.strong.push(Candidate { ngram: pivot.clone(), density: strong_density, window: windows.strong });
        }
        if elong_density >= min_density {
            collector.elongation.push(Candidate { ngram: pivot.clone(), density: elong_density, window: windows.elongation });
        }
        if alt_density >= min_density {
            collector.alt_ending.push(Candidate { ngram: pivot.clone(), density: alt_density, window: windows.alt_ending_scan });
        }
    }
    collector
}

/// A maximal run of overlapping candidates merged into one interval.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighborhood {
    pub start: usize,
    pub end: usize,
    pub members: Vec<LocatedNGram>,
}

impl fmt::Display for Neighborhood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NHood[{}-{}],size={}", self.start, self.end, self.members.len())
    }
}

#[derive(Debug, Clone, Default)]
pub struct NeighborhoodCollector {
    pub strong: Vec<Neighborhood>,
    pub elongation: Vec<Neighborhood>,
    pub alt_ending: Vec<Neighborhood>,
}

/// Partitions a sorted candidate list into neighborhoods using window `w`.
pub fn assign_neighborhoods(candidates: &[Candidate], w: usize) -> Vec<Neighborhood> {
    let mut out: Vec<Neighborhood> = Vec::new();
    for c in candidates {
        let loc = c.ngram.offset;
        let reach = loc.saturating_add(w);
        if let Some(cur) = out.last_mut() {
            let inside = loc > cur.start && loc <= cur.end;
            let reaches_in = reach >= cur.start && reach < cur.end;
            if inside || reaches_in {
                cur.start = cur.start.min(loc);
                cur.end = cur.end.max(reach);
                cur.members.push(c.ngram.clone());
                continue;
            }
        }
        out.push(Neighborhood { start: loc, end: reach, members: vec![c.ngram.clone()] });
    }
    out
}

pub fn assign_all(candidates: &CandidateCollector, windows: &Windows) -> NeighborhoodCollector {
    NeighborhoodCollector {
        strong: assign_neighborhoods(&candidates.strong, windows.strong),
        elongation: assign_neighborhoods(&candidates.elongation, windows.elongation),
        alt_ending: assign_neighborhoods(&candidates.alt_ending, windows.alt_ending),
    }
}
