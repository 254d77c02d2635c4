use crate::candidates::{assign_all, extract_candidates, locate_ngrams, Windows};
use crate::config::{ConfigError, MatchConfig};
use crate::ngram::SnippetIndex;
use crate::parallel::ParallelRunner;
use crate::promotion::elect_representatives;
use crate::results::{admit_results, prune_strong_matches, UberResultSet};
use crate::snippet::Snippet;
use crate::symbols::SymbolRegistry;
use ahash::AHashMap;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug)]
struct IndexedLog {
    snippet: Arc<Snippet>,
    index: SnippetIndex,
}

/// The searchable corpus: indexed logs, their n-gram tables and the shared
/// identifier registry.
///
/// Indexing takes `&mut self` and matching takes `&self`, so ingest and query
/// phases cannot interleave on one index.
#[derive(Debug)]
pub struct SearchIndex {
    config: MatchConfig,
    registry: SymbolRegistry,
    logs: Vec<IndexedLog>,
    by_id: AHashMap<String, usize>,
    lengths: Vec<usize>,
    runner: OnceCell<ParallelRunner>,
}

impl SearchIndex {
    pub fn new(config: MatchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        Ok(Self {
            config,
            registry: SymbolRegistry::new(),
            logs: Vec::new(),
            by_id: AHashMap::new(),
            lengths: Vec::new(),
            runner: OnceCell::new(),
        })
    }

    pub fn with_runner(config: MatchConfig, runner: ParallelRunner) -> Result<Self, SearchError> {
        let idx = Self::new(config)?;
        let _ = idx.runner.set(runner);
        Ok(idx)
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: MatchConfig) -> Result<(), SearchError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn registry(&self) -> &SymbolRegistry {
        &self.registry
    }

    fn runner(&self) -> &ParallelRunner {
        self.runner.get_or_init(ParallelRunner::new)
    }

    /// Indexes logs at the configured n-gram length.
    pub fn index<I, S>(&mut self, logs: I) -> Result<usize, SearchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<Snippet>>,
    {
        let n = self.config.ngram_length;
        self.index_logs(logs, n)
    }

    /// Adds logs to the corpus, building n-gram tables of length `n`.
    ///
    /// A log whose id is already indexed is replaced, unless it is the very
    /// same snippet, in which case the new length is added to its tables.
    pub fn index_logs<I, S>(&mut self, logs: I, n: usize) -> Result<usize, SearchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<Snippet>>,
    {
        if n == 0 {
            return Err(ConfigError::InvalidNGramLength(n).into());
        }
        if !self.lengths.contains(&n) {
            self.lengths.push(n);
        }

        let mut fresh: Vec<Arc<Snippet>> = Vec::new();
        for snippet in logs.into_iter().map(Into::into) {
            match self.by_id.get(snippet.id()).copied() {
                Some(slot) if Arc::ptr_eq(&self.logs[slot].snippet, &snippet) => {
                    self.logs[slot].index.build(n);
                }
                _ => fresh.push(snippet),
            }
        }

        let registry = &self.registry;
        let indexes = self
            .runner()
            .map(&fresh, |_, s| SnippetIndex::with_length(s.events(), registry, n));

        let added = fresh.len();
        for (snippet, index) in fresh.into_iter().zip(indexes) {
            let id = snippet.id().to_string();
            let entry = IndexedLog { snippet, index };
            match self.by_id.get(&id).copied() {
                Some(slot) => self.logs[slot] = entry,
                None => {
                    self.by_id.insert(id, self.logs.len());
                    self.logs.push(entry);
                }
            }
        }
        info!(added, ngram_length = n, corpus = self.logs.len(), symbols = self.registry.len(), "indexed logs");
        Ok(added)
    }

    pub fn clear_index(&mut self) {
        self.logs.clear();
        self.by_id.clear();
        self.lengths.clear();
    }

    pub fn all_logs(&self) -> Vec<Arc<Snippet>> {
        self.logs.iter().map(|l| l.snippet.clone()).collect()
    }

    pub fn log_by_id(&self, id: &str) -> Option<Arc<Snippet>> {
        self.by_id.get(id).map(|&slot| self.logs[slot].snippet.clone())
    }

    pub fn ngram_lengths(&self) -> &[usize] {
        &self.lengths
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    /// Searches the whole corpus.
    pub fn find_matches(&self, query: &Snippet) -> Result<UberResultSet, SearchError> {
        let targets: Vec<&IndexedLog> = self.logs.iter().collect();
        self.run_query(query, &targets)
    }

    /// Searches only the given logs. Logs that were never indexed contribute
    /// nothing.
    pub fn find_matches_in(&self, query: &Snippet, logs: &[Arc<Snippet>]) -> Result<UberResultSet, SearchError> {
        let mut targets = Vec::with_capacity(logs.len());
        for log in logs {
            match self.by_id.get(log.id()) {
                Some(&slot) => targets.push(&self.logs[slot]),
                None => warn!(log = %log.id(), "log is not indexed; skipping"),
            }
        }
        self.run_query(query, &targets)
    }

    fn run_query(&self, query: &Snippet, targets: &[&IndexedLog]) -> Result<UberResultSet, SearchError> {
        self.config.validate()?;
        let query = Arc::new(query.clone());
        let mut urs = UberResultSet::new(query.clone());
        let mut q_index = SnippetIndex::new(query.events(), &self.registry);

        for &n in &self.lengths {
            q_index.build(n);
            let has_ngrams = q_index.table(n).is_some_and(|t| !t.is_empty());
            if !has_ngrams {
                debug!(ngram_length = n, query_len = query.len(), "query has no n-grams at this length");
                continue;
            }
            let windows = Windows::new(query.len(), &self.config);
            if self.config.parallel_matching {
                let per_log = self.runner().map(targets, |_, log| self.match_log(&query, &q_index, n, log, &windows));
                for r in per_log {
                    urs.merge(r);
                }
            } else {
                for log in targets {
                    urs.merge(self.match_log(&query, &q_index, n, log, &windows));
                }
            }
        }

        let pruned = prune_strong_matches(&mut urs.strong_matches);
        urs.rank_all();
        info!(
            query = %query.id(),
            logs = targets.len(),
            strong = urs.strong_matches.len(),
            weak = urs.weak_matches.len(),
            elongated = urs.elongated_matches.len(),
            alt_ending = urs.alt_ending_matches.len(),
            pruned,
            "query finished"
        );
        Ok(urs)
    }

    fn match_log(
        &self,
        query: &Arc<Snippet>,
        q_index: &SnippetIndex,
        n: usize,
        log: &IndexedLog,
        windows: &Windows,
    ) -> UberResultSet {
        let empty = || UberResultSet::new(query.clone());
        if log.snippet.len() < query.len() {
            return empty();
        }
        let (Some(q_table), Some(log_table)) = (q_index.table(n), log.index.table(n)) else {
            warn!(log = %log.snippet.id(), ngram_length = n, "log was never indexed at this length");
            return empty();
        };

        let located = locate_ngrams(q_table, log_table, n);
        if located.is_empty() {
            return empty();
        }
        debug!(log = %log.snippet.id(), located = located.len(), "located query n-grams");

        let candidates = extract_candidates(&located, windows, self.config.ngram_density);
        debug!(log = %log.snippet.id(), "{candidates}");
        let hoods = assign_all(&candidates, windows);
        debug!(
            log = %log.snippet.id(),
            strong = hoods.strong.len(),
            elong = hoods.elongation.len(),
            alt_end = hoods.alt_ending.len(),
            "assigned neighborhoods"
        );
        let promotions = elect_representatives(
            &hoods,
            q_index.symbols(),
            log.index.symbols(),
            windows,
            self.config.admittance_threshold,
        );
        debug!(log = %log.snippet.id(), ?promotions, "promoted locations");
        admit_results(&promotions, query, &log.snippet, windows, self.config.admittance_threshold)
    }
}
