use crate::event::EventSource;
use crate::symbols::{Symbol, SymbolRegistry};
use ahash::AHashMap;
use std::collections::BTreeMap;
use std::fmt::Write;

/// n-gram key -> strictly increasing start offsets.
pub type NGramTable = AHashMap<String, Vec<usize>>;

/// Delimited key for a run of symbols, e.g. `|3|7|12|`.
pub fn ngram_key(symbols: &[Symbol]) -> String {
    let mut key = String::with_capacity(symbols.len() * 4 + 1);
    key.push('|');
    for s in symbols {
        let _ = write!(key, "{s}|");
    }
    key
}

/// Interned symbols of one snippet plus one n-gram table per built length.
///
/// Stored alongside the snippet; tables are never invalidated once built.
#[derive(Debug, Clone, Default)]
pub struct SnippetIndex {
    symbols: Vec<Symbol>,
    tables: BTreeMap<usize, NGramTable>,
}

impl SnippetIndex {
    pub fn new<E: EventSource>(events: &[E], registry: &SymbolRegistry) -> Self {
        let symbols = events.iter().map(|e| registry.intern(e.identifier())).collect();
        Self { symbols, tables: BTreeMap::new() }
    }

    pub fn with_length<E: EventSource>(events: &[E], registry: &SymbolRegistry, n: usize) -> Self {
        let mut idx = Self::new(events, registry);
        idx.build(n);
        idx
    }

    /// Builds the table for length `n`. Returns false if it already existed.
    pub fn build(&mut self, n: usize) -> bool {
        if n == 0 || self.tables.contains_key(&n) {
            return false;
        }
        let mut table = NGramTable::default();
        if self.symbols.len() >= n {
            for (offset, window) in self.symbols.windows(n).enumerate() {
                table.entry(ngram_key(window)).or_default().push(offset);
            }
        }
        self.tables.insert(n, table);
        true
    }

    pub fn table(&self, n: usize) -> Option<&NGramTable> {
        self.tables.get(&n)
    }

    pub fn lengths(&self) -> impl Iterator<Item = usize> + '_ {
        self.tables.keys().copied()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
