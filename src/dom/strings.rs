//! String Interning Pool
//!
//! Deduplicated storage for names, namespace URIs and character data.
//! Strings are appended to one buffer; ids index `(offset, len)` entries.
//! Id 0 is reserved for the empty string.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};

#[derive(Debug)]
pub struct StringPool {
    /// Entries indexed by string ID: (offset in `data`, byte length)
    entries: Vec<(u32, u32)>,
    data: String,
    /// Hash of string content -> list of IDs with that hash
    hash_index: HashMap<u64, Vec<u32>>,
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new()
    }
}

impl StringPool {
    pub fn new() -> Self {
        StringPool {
            entries: vec![(0, 0)],
            data: String::with_capacity(4096),
            hash_index: HashMap::new(),
        }
    }

    #[inline]
    fn compute_hash(s: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        s.hash(&mut hasher);
        hasher.finish()
    }

    /// Intern a string, returning its id
    pub fn intern(&mut self, s: &str) -> u32 {
        if s.is_empty() {
            return 0;
        }

        let hash = Self::compute_hash(s);
        if let Some(ids) = self.hash_index.get(&hash) {
            if let Some(&id) = ids.iter().find(|&&id| self.get(id) == s) {
                return id;
            }
        }

        let offset = self.data.len() as u32;
        self.data.push_str(s);
        let id = self.entries.len() as u32;
        self.entries.push((offset, s.len() as u32));
        self.hash_index.entry(hash).or_default().push(id);
        id
    }

    /// Id of an already interned string
    pub fn lookup(&self, s: &str) -> Option<u32> {
        if s.is_empty() {
            return Some(0);
        }
        self.hash_index
            .get(&Self::compute_hash(s))?
            .iter()
            .copied()
            .find(|&id| self.get(id) == s)
    }

    /// String for an id; unknown ids resolve to the empty string
    pub fn get(&self, id: u32) -> &str {
        match self.entries.get(id as usize) {
            Some(&(offset, len)) => {
                let start = offset as usize;
                self.data.get(start..start + len as usize).unwrap_or("")
            }
            None => "",
        }
    }

    /// Number of entries, including the reserved empty string
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    pub fn bytes_used(&self) -> usize {
        self.data.len()
    }
}
