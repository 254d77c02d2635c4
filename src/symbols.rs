use ahash::AHashMap;
use std::sync::RwLock;

/// Interned event identifier. Assigned in first-seen order starting at 0.
pub type Symbol = u32;

/// Process-lifetime identifier interning, safe to share across indexing threads.
#[derive(Debug, Default)]
pub struct SymbolRegistry {
    ids: RwLock<AHashMap<String, Symbol>>,
}

impl SymbolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&self, identifier: &str) -> Symbol {
        if let Some(id) = self.lookup(identifier) {
            return id;
        }
        let mut ids = match self.ids.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // another writer may have won the race between the read and write locks
        if let Some(&id) = ids.get(identifier) {
            return id;
        }
        let id = ids.len() as Symbol;
        ids.insert(identifier.to_string(), id);
        id
    }

    pub fn lookup(&self, identifier: &str) -> Option<Symbol> {
        let ids = match self.ids.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        ids.get(identifier).copied()
    }

    pub fn len(&self) -> usize {
        match self.ids.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
