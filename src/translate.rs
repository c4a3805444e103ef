use crate::error::{TunerError, TunerResult};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Contents of a patgen translation file: hyphen minima, the hyphenation
/// mark and the alphabet as lower/upper case pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationTable {
    pub left_hyphen_min: usize,
    pub right_hyphen_min: usize,
    pub hyphenation_mark: char,
    pub alphabet: Vec<(char, char)>,
}

impl TranslationTable {
    pub fn load<P: AsRef<Path>>(path: P) -> TunerResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            TunerError::Config(format!(
                "Cannot open translation table {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(BufReader::new(file))
    }

    /// The header keeps the minima in two 2-column fields followed by the
    /// mark; files written by hand with free spacing are accepted too.
    pub fn parse<R: BufRead>(reader: R) -> TunerResult<Self> {
        let mut lines = reader.lines();
        let header = match lines.next() {
            Some(line) => line?,
            None => return Err(TunerError::Config("Translation table is empty".to_string())),
        };
        let (left_hyphen_min, right_hyphen_min, hyphenation_mark) = parse_header(&header)
            .ok_or_else(|| {
                TunerError::Config(format!("Malformed translation table header: '{}'", header))
            })?;

        let mut alphabet = Vec::new();
        for line in lines {
            let line = line?;
            let mut fields = line.split_whitespace();
            let Some(lower) = fields.next().and_then(|f| f.chars().next()) else {
                continue;
            };
            let upper = fields
                .next()
                .and_then(|f| f.chars().next())
                .unwrap_or_else(|| upper_of(lower));
            alphabet.push((lower, upper));
        }

        Ok(Self {
            left_hyphen_min,
            right_hyphen_min,
            hyphenation_mark,
            alphabet,
        })
    }

    pub fn write_to<W: Write>(&self, mut w: W) -> TunerResult<()> {
        writeln!(
            w,
            "{:>2}{:>2}  {}",
            self.left_hyphen_min, self.right_hyphen_min, self.hyphenation_mark
        )?;
        for (lower, upper) in &self.alphabet {
            writeln!(w, " {} {}", lower, upper)?;
        }
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> TunerResult<()> {
        let mut w = BufWriter::new(File::create(path)?);
        self.write_to(&mut w)?;
        w.flush()?;
        Ok(())
    }
}

fn parse_header(header: &str) -> Option<(usize, usize, char)> {
    let fixed = || {
        let left = header.get(0..2)?.trim().parse().ok()?;
        let right = header.get(2..4)?.trim().parse().ok()?;
        let mark = header.get(4..)?.trim_start().chars().next()?;
        Some((left, right, mark))
    };
    fixed().or_else(|| {
        let mut fields = header.split_whitespace();
        let left = fields.next()?.parse().ok()?;
        let right = fields.next()?.parse().ok()?;
        let mark = fields.next()?.chars().next()?;
        Some((left, right, mark))
    })
}

fn upper_of(c: char) -> char {
    c.to_uppercase().next().unwrap_or(c)
}

/// `<wordlist>.tra`
pub fn default_table_path(wordlist: &Path) -> PathBuf {
    let mut name = wordlist.as_os_str().to_owned();
    name.push(".tra");
    PathBuf::from(name)
}

/// Derives a translation table from a hyphenated wordlist.
///
/// The alphabet is every lower-cased character except the marker. Unless
/// overridden, `left_hyphen_min` is the smallest number of letters before
/// the first marker of any word and `right_hyphen_min` the smallest number
/// after the last one. Lines starting with `#` are ignored.
pub fn build_translation<P: AsRef<Path>>(
    wordlist: P,
    marker: char,
    left_override: Option<usize>,
    right_override: Option<usize>,
) -> TunerResult<TranslationTable> {
    let content = fs::read_to_string(wordlist.as_ref())?;

    let mut chars = BTreeSet::new();
    let mut left_min: Option<usize> = None;
    let mut right_min: Option<usize> = None;

    for line in content.lines() {
        if line.starts_with('#') {
            continue;
        }
        let line = line.trim();
        let mut first = None;
        let mut last = None;
        let mut len = 0;
        for (i, c) in line.chars().enumerate() {
            len = i + 1;
            if c == marker {
                first.get_or_insert(i);
                last = Some(i);
                continue;
            }
            if !c.is_whitespace() {
                chars.extend(c.to_lowercase());
            }
        }
        if let (Some(first), Some(last)) = (first, last) {
            left_min = Some(left_min.map_or(first, |m| m.min(first)));
            let after = len - last - 1;
            right_min = Some(right_min.map_or(after, |m| m.min(after)));
        }
    }

    let resolve = |name: &str, over: Option<usize>, found: Option<usize>| {
        over.or(found).unwrap_or_else(|| {
            warn!("No hyphenated word found, {} defaults to 1", name);
            1
        })
    };

    Ok(TranslationTable {
        left_hyphen_min: resolve("left_hyphen_min", left_override, left_min),
        right_hyphen_min: resolve("right_hyphen_min", right_override, right_min),
        hyphenation_mark: marker,
        alphabet: chars.into_iter().map(|c| (c, upper_of(c))).collect(),
    })
}

/// Builds the table for `wordlist` and saves it as `<wordlist>.tra`.
pub fn make_translation_file<P: AsRef<Path>>(
    wordlist: P,
    marker: char,
    left_override: Option<usize>,
    right_override: Option<usize>,
) -> TunerResult<PathBuf> {
    let wordlist = wordlist.as_ref();
    let table = build_translation(wordlist, marker, left_override, right_override)?;
    let path = default_table_path(wordlist);
    table.save(&path)?;
    info!(
        "Translation table with {} letters written to {}",
        table.alphabet.len(),
        path.display()
    );
    Ok(path)
}
