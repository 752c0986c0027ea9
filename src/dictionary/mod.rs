// src/dictionary/mod.rs
// =============================================================================
// Turning raw dictionary words into candidate paths.
//
// Submodules:
// - wordlist: cleans raw words (comments, case, duplicates) and reads files
// - synth:    expands words with extension / prefix / suffix rules
//
// The candidate set is computed once per session and shared by every
// recursion level.
// =============================================================================

mod synth;
mod wordlist;

pub use synth::{replace_extension, synthesize_paths, EXT_TOKEN, PROTECTED_EXTENSIONS};
pub use wordlist::{apply_case, prepare_words, read_wordlist_file};
