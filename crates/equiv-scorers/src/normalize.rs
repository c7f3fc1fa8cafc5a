//! Title normalisation
//!
//! Shared by the title scorers and the title search generator. Everything
//! here is a pure string transform.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Prefixes removed before comparing titles (case-insensitive)
pub const COMMON_PREFIXES: &[&str] = &["the ", "live "];

/// Words ignored when comparing word sets
pub const STOP_WORDS: &[&str] = &["the", "in", "a", "and", "&", "of", "to", "show"];

static SLASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s?/\s?").expect("slash pattern is valid"));

/// Runs of punctuation; apostrophes and whitespace are kept
pub(crate) static NON_ALPHANUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^A-Za-z0-9\s']+").expect("non-alphanumeric pattern is valid")
});

/// Matches e.g. "2. Kinross" or "12 - Finale"
static SEQUENCE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\d+\s*[.:\-]\s*(.*)$").expect("sequence prefix pattern is valid")
});

const ABBREVIATIONS: &[(&str, &str)] = &[
    ("dr", "doctor"),
    ("mr", "mister"),
    ("mrs", "missus"),
    ("st", "saint"),
    ("1st", "first"),
    ("2nd", "second"),
    ("3rd", "third"),
    ("4th", "fourth"),
    ("5th", "fifth"),
    ("6th", "sixth"),
    ("7th", "seventh"),
    ("8th", "eighth"),
    ("9th", "ninth"),
    ("10th", "tenth"),
    ("0", "zero"),
    ("1", "one"),
    ("2", "two"),
    ("3", "three"),
    ("4", "four"),
    ("5", "five"),
    ("6", "six"),
    ("7", "seven"),
    ("8", "eight"),
    ("9", "nine"),
    ("10", "ten"),
];

/// Expands abbreviations (honorifics, ordinal and cardinal digits) word by
/// word and lowercases the result
///
/// # Examples
///
/// ```
/// use equiv_scorers::normalize::TitleExpander;
///
/// let expander = TitleExpander::default();
/// assert_eq!(expander.expand("Dr. Who"), "doctor who");
/// assert_eq!(expander.expand("The 2nd Coming"), "the second coming");
/// ```
#[derive(Debug, Clone)]
pub struct TitleExpander {
    expansions: HashMap<String, String>,
}

impl Default for TitleExpander {
    fn default() -> Self {
        Self::new(ABBREVIATIONS.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }
}

impl TitleExpander {
    /// Expander over a custom table; keys are matched lowercase
    pub fn new(expansions: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            expansions: expansions
                .into_iter()
                .map(|(k, v)| (k.to_lowercase(), v))
                .collect(),
        }
    }

    /// Expand every word that has an entry; a trailing `.` on the word is
    /// treated as part of the abbreviation
    pub fn expand(&self, title: &str) -> String {
        title
            .to_lowercase()
            .split_whitespace()
            .map(|word| {
                let key = word.strip_suffix('.').unwrap_or(word);
                match self.expansions.get(key) {
                    Some(expanded) => expanded.as_str(),
                    None => word,
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Remove a leading sequence number such as "2. "
pub fn remove_sequence_prefix(title: &str) -> String {
    match SEQUENCE_PREFIX.captures(title) {
        Some(caps) => caps[1].to_string(),
        None => title.to_string(),
    }
}

/// Remove [`COMMON_PREFIXES`], case-insensitively, when something remains
pub fn remove_common_prefixes(title: &str) -> String {
    let mut title = title.to_string();
    for prefix in COMMON_PREFIXES {
        if title.len() > prefix.len()
            && title.is_char_boundary(prefix.len())
            && title[..prefix.len()].eq_ignore_ascii_case(prefix)
        {
            title = title[prefix.len()..].to_string();
        }
    }
    title
}

/// Fold accented Latin letters to their ASCII base letter
pub fn strip_accents(title: &str) -> String {
    title.chars().map(fold_accent).collect()
}

fn fold_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => 'a',
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' | 'Ă' | 'Ą' => 'A',
        'ç' | 'ć' | 'č' => 'c',
        'Ç' | 'Ć' | 'Č' => 'C',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' | 'ě' => 'e',
        'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ę' | 'Ě' => 'E',
        'ì' | 'í' | 'î' | 'ï' | 'ī' => 'i',
        'Ì' | 'Í' | 'Î' | 'Ï' | 'Ī' => 'I',
        'ñ' | 'ń' | 'ň' => 'n',
        'Ñ' | 'Ń' | 'Ň' => 'N',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => 'o',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ō' | 'Ő' => 'O',
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => 'u',
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ū' | 'Ů' | 'Ű' => 'U',
        'ý' | 'ÿ' => 'y',
        'Ý' => 'Y',
        'š' | 'ś' => 's',
        'Š' | 'Ś' => 'S',
        'ž' | 'ź' | 'ż' => 'z',
        'Ž' | 'Ź' | 'Ż' => 'Z',
        other => other,
    }
}

/// Word-level replacements applied before punctuation is collapsed
pub fn apply_common_replacements(title: &str) -> String {
    title
        .replace(" vs. ", " vs ")
        .replace(" v ", " vs ")
        .replace(" & ", " and ")
        .replace("fc ", "")
        .replace(',', "")
}

/// Collapse punctuation and whitespace into dashes
///
/// Dots and apostrophes are dropped, a slash with optional surrounding
/// spaces becomes a dash, and every other run of non-alphanumerics becomes
/// a dash.
pub fn replace_special_chars(title: &str) -> String {
    let replaced = apply_common_replacements(title).replace('.', "");
    let replaced = SLASH.replace_all(&replaced, "-");
    let replaced = NON_ALPHANUMERIC.replace_all(&replaced, "-");
    replaced.replace('\'', "").replace(' ', "-")
}

/// Lowercased words of `title` with stop words and punctuation removed
pub fn significant_words(title: &str, expander: &TitleExpander) -> Vec<String> {
    let mut words: Vec<String> = expander
        .expand(title)
        .split_whitespace()
        .map(|w| w.chars().filter(|c| c.is_alphanumeric()).collect::<String>())
        .filter(|w| !w.is_empty() && !STOP_WORDS.contains(&w.as_str()))
        .collect();
    words.sort();
    words.dedup();
    words
}
