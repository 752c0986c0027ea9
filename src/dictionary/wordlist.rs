// src/dictionary/wordlist.rs
// =============================================================================
// Raw word preparation.
//
// Word sources (files, remote lists, databases) are opaque to the engine;
// whatever they produce goes through prepare_words() so the synthesizer
// always receives a clean, deduplicated, ordered list.
//
// read_wordlist_file() is the local-file source used by the binary.
// =============================================================================

use crate::config::CaseTransform;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

/// Trims, drops blanks and `#` comments, applies `case`, deduplicates in order
pub fn prepare_words<I, S>(raw: I, case: CaseTransform) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut words = Vec::new();

    for line in raw {
        let word = line.as_ref().trim();
        if word.is_empty() || word.starts_with('#') {
            continue;
        }
        let word = apply_case(word, case);
        if seen.insert(word.clone()) {
            words.push(word);
        }
    }

    words
}

/// Applies one case transform to a word
pub fn apply_case(word: &str, case: CaseTransform) -> String {
    match case {
        CaseTransform::None => word.to_string(),
        CaseTransform::Lower => word.to_lowercase(),
        CaseTransform::Upper => word.to_uppercase(),
        CaseTransform::Capitalize => capitalize(word),
    }
}

// Upper-cases the first letter of every alphanumeric run, lower-cases the rest
fn capitalize(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut at_boundary = true;
    for c in word.chars() {
        if at_boundary {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        at_boundary = !(c.is_alphanumeric() || c == '_');
    }
    out
}

/// Reads raw lines from a wordlist file, or from every file in a directory
///
/// Directory entries are read in file-name order. The lines are returned
/// unprocessed; pass them through [`prepare_words`].
pub fn read_wordlist_file(path: &Path) -> io::Result<Vec<String>> {
    if path.is_dir() {
        let mut files: Vec<_> = fs::read_dir(path)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect();
        files.sort();

        let mut lines = Vec::new();
        for file in files {
            lines.extend(read_lines(&file)?);
        }
        Ok(lines)
    } else {
        read_lines(path)
    }
}

fn read_lines(path: &Path) -> io::Result<Vec<String>> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes)
        .lines()
        .map(str::to_string)
        .collect())
}
