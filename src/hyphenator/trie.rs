use crate::error::{TunerError, TunerResult};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// `(position, strength)` pairs: a strength digit found before the
/// `position`-th letter of the affix.
pub type Output = Vec<(usize, u8)>;

#[derive(Debug, Default)]
pub struct TrieNode {
    output: Option<Output>,
    children: HashMap<char, TrieNode>,
}

impl TrieNode {
    pub fn child(&self, c: char) -> Option<&TrieNode> {
        self.children.get(&c)
    }

    pub fn output(&self) -> Option<&[(usize, u8)]> {
        self.output.as_deref()
    }
}

/// Prefix tree over pattern letters. Digits inside an inserted pattern are
/// not letters; they become the output of the node the letters lead to.
#[derive(Debug, Default)]
pub struct Trie {
    root: TrieNode,
    len: usize,
}

impl Trie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a pattern such as `.ab1c`. Returns `false`, leaving the trie
    /// unchanged for that affix, if its letters already carry an output.
    pub fn insert(&mut self, pattern: &str) -> bool {
        let mut current = &mut self.root;
        let mut output = Vec::new();
        let mut letters = 0;
        for c in pattern.chars() {
            match c.to_digit(10) {
                Some(d) if d > 0 => output.push((letters, d as u8)),
                _ => {
                    current = current.children.entry(c).or_default();
                    letters += 1;
                }
            }
        }
        if current.output.is_some() {
            return false;
        }
        current.output = Some(output);
        self.len += 1;
        true
    }

    /// Output stored for `word`, skipping any character in `ignore`.
    pub fn find(&self, word: &str, ignore: &str) -> Option<&[(usize, u8)]> {
        let mut current = &self.root;
        for c in word.chars() {
            if ignore.contains(c) {
                continue;
            }
            current = current.children.get(&c)?;
        }
        current.output()
    }

    pub fn root(&self) -> &TrieNode {
        &self.root
    }

    /// Number of affixes stored.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Builds a trie from one pattern per line. A repeated affix aborts
    /// construction.
    pub fn from_reader<R: BufRead>(reader: R) -> TunerResult<Self> {
        let mut trie = Self::new();
        for line in reader.lines() {
            let line = line?;
            let pattern = line.trim();
            if pattern.is_empty() {
                continue;
            }
            if !trie.insert(pattern) {
                return Err(TunerError::DuplicateAffix(pattern.to_string()));
            }
        }
        Ok(trie)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> TunerResult<Self> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }
}
