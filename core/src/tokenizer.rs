use anyhow::{Context, Result};
use jieba_rs::Jieba;
use lazy_static::lazy_static;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Separator of the stored term sequence; never part of a term.
pub const TERM_DELIMITER: char = '/';

lazy_static! {
    static ref JIEBA: Jieba = Jieba::new();
    static ref BUILTIN_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves",
            "的","了","和","是","在","也","就","都","而","及","与","着","或","一个","没有","我们","你们","他们","它们",
        ];
        words.iter().copied().collect()
    };
}

#[derive(Debug, Clone, Default)]
pub struct Stopwords {
    words: HashSet<String>,
}

impl Stopwords {
    pub fn builtin() -> Self {
        Self::from_words(BUILTIN_STOPWORDS.iter().copied())
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { words: words.into_iter().map(Into::into).collect() }
    }

    /// Merges every `*.txt` file in `dir`, one word per line.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut words = HashSet::new();
        let entries = fs::read_dir(dir).with_context(|| format!("reading stopword dir {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") { continue; }
            let text = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
            words.extend(text.lines().map(str::trim).filter(|l| !l.is_empty()).map(String::from));
        }
        tracing::debug!(dir = %dir.display(), count = words.len(), "loaded stopwords");
        Ok(Self { words })
    }

    /// Directory source when given, built-in list otherwise.
    pub fn from_source(dir: Option<&Path>) -> Result<Self> {
        match dir {
            Some(d) => Self::load_dir(d),
            None => Ok(Self::builtin()),
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token) || self.words.contains(&token.to_lowercase())
    }

    pub fn len(&self) -> usize { self.words.len() }
    pub fn is_empty(&self) -> bool { self.words.is_empty() }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentMode {
    /// Overlapping sub-segmentations of compounds, used for indexing.
    Search,
    /// One non-overlapping segmentation, used for queries.
    Precise,
}

#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    stopwords: Stopwords,
}

impl Segmenter {
    pub fn new(stopwords: Stopwords) -> Self {
        Self { stopwords }
    }

    /// Ordered term sequence with stopwords, punctuation-only tokens and
    /// tokens containing the delimiter removed.
    pub fn segment(&self, text: &str, mode: SegmentMode) -> Vec<String> {
        let raw = match mode {
            SegmentMode::Search => JIEBA.cut_for_search(text, true),
            SegmentMode::Precise => JIEBA.cut(text, true),
        };
        raw.into_iter()
            .filter(|t| t.chars().any(char::is_alphanumeric))
            .filter(|t| !t.contains(TERM_DELIMITER))
            .filter(|t| !self.stopwords.contains(t))
            .map(String::from)
            .collect()
    }
}

pub fn join_terms<S: AsRef<str>>(terms: &[S]) -> String {
    let parts: Vec<&str> = terms.iter().map(|t| t.as_ref()).collect();
    parts.join(&TERM_DELIMITER.to_string())
}

pub fn split_terms(stored: &str) -> Vec<String> {
    stored
        .trim()
        .split(TERM_DELIMITER)
        .filter(|t| !t.trim().is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_sequence_round_trips() {
        let terms = vec!["情感".to_string(), "分析".to_string()];
        assert_eq!(split_terms(&join_terms(&terms)), terms);
        assert!(split_terms("  ").is_empty());
    }

    #[test]
    fn stopwords_match_case_insensitively() {
        let sw = Stopwords::from_words(["the"]);
        assert!(sw.contains("The"));
        assert!(!sw.contains("cat"));
    }
}
