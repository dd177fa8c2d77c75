//! Bitset over terminal symbol ids.

use lignum_table::SymbolId;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub(crate) struct TokenSet {
    words: Vec<u64>,
}

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(symbol: SymbolId) -> Self {
        let mut set = Self::new();
        set.insert(symbol);
        set
    }

    /// Insert a symbol, returning whether it was absent.
    pub fn insert(&mut self, symbol: SymbolId) -> bool {
        let (word, bit) = (symbol as usize / 64, symbol as usize % 64);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        let mask = 1u64 << bit;
        let absent = self.words[word] & mask == 0;
        self.words[word] |= mask;
        absent
    }

    #[cfg(test)]
    pub fn contains(&self, symbol: SymbolId) -> bool {
        let (word, bit) = (symbol as usize / 64, symbol as usize % 64);
        self.words.get(word).is_some_and(|w| w & (1u64 << bit) != 0)
    }

    /// Union `other` into `self`, returning whether anything was added.
    pub fn union_with(&mut self, other: &TokenSet) -> bool {
        if other.words.len() > self.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        let mut changed = false;
        for (mine, theirs) in self.words.iter_mut().zip(&other.words) {
            let merged = *mine | theirs;
            changed |= merged != *mine;
            *mine = merged;
        }
        changed
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            (0..64)
                .filter(move |bit| word & (1u64 << bit) != 0)
                .map(move |bit| (i * 64 + bit) as SymbolId)
        })
    }
}
