pub mod trie;

pub use self::trie::{Trie, TrieNode};
use crate::error::TunerResult;
pub use crate::translate::TranslationTable;
use std::path::Path;

/// Liang-style hyphenation with a fixed pattern set.
///
/// Every substring of the boundary-padded word is looked up; each match
/// raises the level of the letter gaps it covers to at least its digit.
/// Gaps ending on an odd level are hyphenated, provided they leave
/// `left_hyphen_min` letters before and `right_hyphen_min` letters after.
#[derive(Debug)]
pub struct Hyphenator {
    patterns: Trie,
    word_boundary: char,
    hyphenation_mark: char,
    left_hyphen_min: usize,
    right_hyphen_min: usize,
}

impl Hyphenator {
    pub fn new(patterns: Trie) -> Self {
        Self {
            patterns,
            word_boundary: '.',
            hyphenation_mark: '-',
            left_hyphen_min: 1,
            right_hyphen_min: 1,
        }
    }

    /// Patterns from `pattern_file`, hyphen minima from `table`, and `mark`
    /// as the inserted character.
    pub fn from_files<P: AsRef<Path>>(
        pattern_file: P,
        table: &TranslationTable,
        mark: char,
    ) -> TunerResult<Self> {
        Ok(Self::new(Trie::from_file(pattern_file)?)
            .with_mark(mark)
            .with_hyphen_min(table.left_hyphen_min, table.right_hyphen_min))
    }

    pub fn with_mark(mut self, mark: char) -> Self {
        self.hyphenation_mark = mark;
        self
    }

    pub fn with_hyphen_min(mut self, left: usize, right: usize) -> Self {
        self.left_hyphen_min = left;
        self.right_hyphen_min = right;
        self
    }

    /// Level of every gap of `word`: entry `k` is the gap before letter `k`,
    /// the last entry the gap after the final letter.
    pub fn levels(&self, word: &str) -> Vec<u8> {
        let mut bounded = Vec::with_capacity(word.len() + 2);
        bounded.push(self.word_boundary);
        bounded.extend(word.chars().map(|c| c.to_lowercase().next().unwrap_or(c)));
        bounded.push(self.word_boundary);

        let mut levels = vec![0u8; bounded.len() - 1];
        for start in 0..bounded.len() - 1 {
            let mut node = self.patterns.root();
            for &c in &bounded[start..] {
                if c == self.hyphenation_mark {
                    continue;
                }
                let Some(next) = node.child(c) else {
                    break;
                };
                node = next;
                let Some(output) = node.output() else {
                    continue;
                };
                for &(index, value) in output {
                    // position `start + index` in the padded word is the gap
                    // before letter `start + index - 1` of the bare word
                    let Some(gap) = (start + index).checked_sub(1) else {
                        continue;
                    };
                    if let Some(level) = levels.get_mut(gap) {
                        *level = (*level).max(value);
                    }
                }
            }
        }
        levels
    }

    pub fn hyphenate(&self, word: &str) -> String {
        let levels = self.levels(word);
        let n = word.chars().count();
        let mut hyphenated = String::with_capacity(word.len() * 2);
        for (i, letter) in word.chars().enumerate() {
            if levels[i] % 2 == 1
                && self.left_hyphen_min <= i
                && i + self.right_hyphen_min <= n
            {
                hyphenated.push(self.hyphenation_mark);
            }
            hyphenated.push(letter);
        }
        hyphenated
    }
}
