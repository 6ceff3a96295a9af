use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

use crate::error::{Error, Result};

/// Immutable, ordered sequence of lowercase words for passphrase
/// generation. Loaded once per process and shared by reference; the
/// generators never mutate or copy it.
#[derive(Debug, Clone, Default)]
pub struct Wordlist {
    words: Vec<String>,
}

impl Wordlist {
    pub fn new(words: Vec<String>) -> Self {
        Wordlist { words }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Load a wordlist file. Accepts one word per line, or the
    /// tab-indexed Diceware format ("11116\tabacus") where the word is
    /// the last column.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let list = Self::from_reader(BufReader::new(file))?;
        info!(
            "Loaded {} words from {}",
            list.len(),
            path.as_ref().display()
        );
        Ok(list)
    }

    /// Parse wordlist lines from any buffered reader.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut words = Vec::new();

        for line in reader.lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let word = trimmed.rsplit('\t').next().unwrap_or(trimmed);
            words.push(word.to_ascii_lowercase());
        }

        if words.is_empty() {
            return Err(Error::EmptyWordlist);
        }

        Ok(Wordlist { words })
    }
}
