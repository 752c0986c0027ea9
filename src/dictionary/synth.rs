// src/dictionary/synth.rs
// =============================================================================
// Path synthesis.
//
// For each word, in order:
// 1. skip it if it ends with ".<excluded extension>"
// 2. expand extensions according to the ExtensionMode
// 3. emit prefix + word for every prefix
// 4. emit word + suffix for every suffix (not for directories, "word/")
//
// The whole sequence is then deduplicated keeping the first occurrence, so
// the order of the output is stable and deterministic.
// =============================================================================

use crate::config::{DictionaryConfig, ExtensionMode};
use std::collections::HashSet;

/// Placeholder substituted with each extension in default mode
pub const EXT_TOKEN: &str = "%EXT%";

/// Extensions that overwrite mode leaves alone
pub const PROTECTED_EXTENSIONS: &[&str] = &[
    "log", "json", "xml", "jpg", "jpeg", "png", "gif", "bmp", "ico", "svg", "css", "js", "woff",
    "woff2", "ttf", "eot",
];

/// Expands `words` into the deduplicated candidate path list
///
/// An empty word list yields an empty path list.
pub fn synthesize_paths(words: &[String], rules: &DictionaryConfig) -> Vec<String> {
    let mut paths = Vec::with_capacity(words.len() * (rules.extensions.len() + 1));

    for word in words {
        if is_excluded(word, &rules.exclude_extensions) {
            continue;
        }

        match rules.extension_mode {
            ExtensionMode::Force => {
                paths.push(word.clone());
                for ext in &rules.extensions {
                    paths.push(format!("{}.{}", word, ext));
                }
                paths.push(format!("{}/", word));
            }
            ExtensionMode::Overwrite => {
                paths.push(word.clone());
                for ext in &rules.extensions {
                    if let Some(variant) = replace_extension(word, ext) {
                        paths.push(variant);
                    }
                }
            }
            ExtensionMode::Default => {
                if word.contains(EXT_TOKEN) {
                    for ext in &rules.extensions {
                        paths.push(word.replace(EXT_TOKEN, ext));
                    }
                } else {
                    paths.push(word.clone());
                }
            }
        }

        for prefix in &rules.prefixes {
            paths.push(format!("{}{}", prefix, word));
        }

        if !word.ends_with('/') {
            for suffix in &rules.suffixes {
                paths.push(format!("{}{}", word, suffix));
            }
        }
    }

    dedup_in_order(paths)
}

/// Replaces the trailing `.xxx` of `word` with `.new_ext`, or appends it
///
/// Returns `None` when the current extension is protected.
pub fn replace_extension(word: &str, new_ext: &str) -> Option<String> {
    match trailing_extension(word) {
        Some(current) => {
            let lower = current.to_ascii_lowercase();
            if PROTECTED_EXTENSIONS.contains(&lower.as_str()) {
                return None;
            }
            let stem = &word[..word.len() - current.len() - 1];
            Some(format!("{}.{}", stem, new_ext))
        }
        None => Some(format!("{}.{}", word, new_ext)),
    }
}

// The alphanumeric run after the last '.', if the word ends with one
fn trailing_extension(word: &str) -> Option<&str> {
    let dot = word.rfind('.')?;
    let ext = &word[dot + 1..];
    if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(ext)
    } else {
        None
    }
}

fn is_excluded(word: &str, excluded: &[String]) -> bool {
    excluded
        .iter()
        .any(|ext| word.ends_with(&format!(".{}", ext)))
}

fn dedup_in_order(paths: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(paths.len());
    paths
        .into_iter()
        .filter(|path| seen.insert(path.clone()))
        .collect()
}
