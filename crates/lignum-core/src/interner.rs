//! String interning for rule and symbol names.
//!
//! Converts heap-allocated strings into cheap integer handles (`Name`).
//! Comparing two names is O(1) integer comparison.

use std::collections::HashMap;

/// A lightweight handle to an interned string.
///
/// Names are ordered by insertion order, not lexicographically. The table
/// generator relies on this: rule declaration order is the interning order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Name(u32);

impl Name {
    /// Raw index, usable as a dense array index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// String interner. Deduplicates strings and returns cheap `Name` handles.
#[derive(Debug, Clone, Default)]
pub struct Interner {
    map: HashMap<String, Name>,
    strings: Vec<String>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning the existing handle if already present.
    pub fn intern(&mut self, s: &str) -> Name {
        if let Some(&name) = self.map.get(s) {
            return name;
        }

        let name = Name(self.strings.len() as u32);
        self.strings.push(s.to_owned());
        self.map.insert(s.to_owned(), name);
        name
    }

    /// Look up a string without interning it.
    #[inline]
    pub fn get(&self, s: &str) -> Option<Name> {
        self.map.get(s).copied()
    }

    /// Resolve a handle back to its string.
    ///
    /// # Panics
    /// Panics if the handle was not created by this interner.
    #[inline]
    pub fn resolve(&self, name: Name) -> &str {
        &self.strings[name.0 as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Iterate over all interned strings in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Name, &str)> {
        self.strings
            .iter()
            .enumerate()
            .map(|(i, s)| (Name(i as u32), s.as_str()))
    }
}
