use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Sentinel used for q-gram padding. Never survives `normalize`.
pub const PADDING: char = '$';

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"(?u)\W").expect("valid regex");
}

/// Strip every non-word character (anything but letters, digits and `_`) and lowercase.
pub fn normalize(text: &str) -> String {
    let composed = text.nfc().collect::<String>();
    NON_WORD.replace_all(&composed, "").to_lowercase()
}

/// The q-grams of `text` as indexed: normalized and padded with `q - 1` sentinels on both sides.
pub fn qgrams(text: &str, q: usize) -> QGrams {
    QGrams::new(&normalize(text), q, true)
}

/// The q-grams of a prefix query: normalized and padded on the left only.
pub fn prefix_qgrams(text: &str, q: usize) -> QGrams {
    QGrams::new(&normalize(text), q, false)
}

/// Lazy sequence of overlapping q-grams over a padded, normalized string.
///
/// Cloning yields an independent iterator starting from the same position.
#[derive(Debug, Clone)]
pub struct QGrams {
    padded: Vec<char>,
    q: usize,
    pos: usize,
}

impl QGrams {
    fn new(normalized: &str, q: usize, pad_right: bool) -> Self {
        let pad = q.saturating_sub(1);
        let mut padded = Vec::with_capacity(normalized.len() + 2 * pad);
        padded.extend(std::iter::repeat(PADDING).take(pad));
        padded.extend(normalized.chars());
        if pad_right {
            padded.extend(std::iter::repeat(PADDING).take(pad));
        }
        Self { padded, q, pos: 0 }
    }

    fn total(&self) -> usize {
        if self.q == 0 || self.padded.len() < self.q {
            0
        } else {
            self.padded.len() - self.q + 1
        }
    }
}

impl Iterator for QGrams {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.pos >= self.total() {
            return None;
        }
        let gram = self.padded[self.pos..self.pos + self.q].iter().collect();
        self.pos += 1;
        Some(gram)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.total().saturating_sub(self.pos);
        (left, Some(left))
    }
}

impl ExactSizeIterator for QGrams {}
