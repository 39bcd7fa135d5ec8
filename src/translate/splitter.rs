use regex::Regex;
use std::sync::LazyLock;

use crate::config::TranslationConfig;

/// Sentence terminator followed by one whitespace character
static TERMINATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.?!]\s").unwrap());

/// Lowercased abbreviations (without the final period) that never end a sentence
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "mt", "vs", "etc", "inc", "ltd", "co",
    "corp", "no", "vol", "fig", "dept", "gen", "col", "lt", "sgt", "capt", "rev", "gov", "sen",
    "rep", "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec",
    "e.g", "i.e", "a.m", "p.m", "u.s", "u.k", "approx", "est", "min", "max",
];

/// Strategy for cutting segment text into sentences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceSplitter {
    /// Punctuation walk with abbreviation and casing heuristics
    Linguistic,
    /// Terminator + whitespace + capital letter, with `x.y.` and `Mr.` guards
    Regex,
}

impl SentenceSplitter {
    pub fn from_config(config: &TranslationConfig) -> Self {
        if config.use_regex_splitter {
            Self::Regex
        } else {
            Self::Linguistic
        }
    }

    /// Split `text` into trimmed, non-empty sentences in order
    pub fn split(&self, text: &str) -> Vec<String> {
        let pieces = match self {
            Self::Linguistic => split_linguistic(text),
            Self::Regex => split_regex(text),
        };

        pieces
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Last whitespace-delimited word before byte offset `end`, without leading punctuation
fn word_before(text: &str, end: usize) -> &str {
    let head = &text[..end];
    let start = head
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    head[start..].trim_start_matches(|c: char| !is_word_char(c))
}

fn split_linguistic(text: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];
        if !matches!(c, '.' | '?' | '!') {
            i += 1;
            continue;
        }

        // Absorb runs like "?!" or "..." and trailing closers
        let mut j = i + 1;
        while j < chars.len() && matches!(chars[j].1, '.' | '?' | '!' | '"' | '\'' | ')' | ']' | '»' | '”') {
            j += 1;
        }

        // A boundary needs whitespace (or the end of the text) after the terminator
        if j < chars.len() && !chars[j].1.is_whitespace() {
            i = j;
            continue;
        }

        let end = chars.get(j).map(|&(o, _)| o).unwrap_or(text.len());
        let mut next = j;
        while next < chars.len() && chars[next].1.is_whitespace() {
            next += 1;
        }
        let next_char = chars.get(next).map(|&(_, ch)| ch);

        let is_boundary = match next_char {
            None => true,
            Some(ch) if ch.is_lowercase() => false,
            Some(_) if c == '.' => {
                let word = word_before(text, offset).to_lowercase();
                let single_initial = word.chars().count() == 1 && word.chars().all(char::is_alphabetic);
                !(ABBREVIATIONS.contains(&word.as_str()) || single_initial)
            }
            Some(_) => true,
        };

        if is_boundary {
            sentences.push(&text[start..end]);
            start = end;
        }
        i = j;
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}

fn split_regex(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for m in TERMINATOR.find_iter(text) {
        // Byte offset of the whitespace character
        let ws = m.start() + 1;
        let after = &text[m.end()..];

        if !after.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
            continue;
        }

        // Nearest character first
        let before: Vec<char> = text[..ws].chars().rev().take(4).collect();

        // "e.g." / "U.S." style: word char, period, word char, any
        if before.len() == 4 && is_word_char(before[3]) && before[2] == '.' && is_word_char(before[1]) {
            continue;
        }

        // "Mr." / "Dr." style: capital, lowercase, period
        if before.len() >= 3 && before[0] == '.' && before[1].is_ascii_lowercase() && before[2].is_ascii_uppercase() {
            continue;
        }

        sentences.push(&text[start..ws]);
        start = m.end();
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}
