//! Built-in text actions and the default registry.
//!
//! These are the reference leaf transformations: pure functions over
//! `serde_json::Value` with no shared state. They are deliberately simple;
//! callers with stricter needs register their own implementations under the
//! same names.

use std::collections::HashSet;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::action_registry::{ActionRegistry, Params};
use crate::error::ActionError;

// A tag must start with a name, so bare `<` / `>` in text survive
static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<[/!?]?[A-Za-z][^>]*>").expect("valid tag regex"));

static SCRIPT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script>|<style\b[^>]*>.*?</style>|<!--.*?-->")
        .expect("valid script regex")
});

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+(?:'\w+)?|[^\w\s]+").expect("valid token regex"));

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| ENGLISH_STOPWORDS.iter().copied().collect());

const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't",
    "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn",
    "wouldn't",
];

const NAME_TITLES: &[&str] = &[
    "mr", "mrs", "ms", "miss", "mx", "dr", "prof", "sir", "dame", "rev", "fr", "hon", "capt",
];

const NAME_SUFFIXES: &[&str] = &[
    "jr", "sr", "ii", "iii", "iv", "v", "phd", "md", "esq", "dds", "cpa",
];

/// Build a registry holding every built-in action.
pub fn builtin_registry() -> ActionRegistry {
    let mut registry = ActionRegistry::new();
    register_builtins(&mut registry);
    registry
}

/// Add the built-in actions to an existing registry.
pub fn register_builtins(registry: &mut ActionRegistry) {
    registry.register_with_params("format_id", &["prefix"], format_id);
    registry.register_with_params("clean_html", &[], clean_html);
    registry.register_with_params("format_name", &[], format_name);
    registry.register_with_params("format_tags", &["separator"], format_tags);
    registry.register_with_params("remove_stopwords", &[], remove_stopwords);
    registry.register_with_params("extract_entities", &[], extract_entities);
}

fn expect_str<'a>(value: &'a Value, action: &str) -> Result<&'a str, ActionError> {
    value
        .as_str()
        .ok_or_else(|| ActionError::InvalidInput(format!("{} expects a string, got {}", action, value)))
}

fn string_param<'a>(params: &'a Params, name: &str, default: &'a str) -> Result<&'a str, ActionError> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(other) => Err(ActionError::InvalidParam {
            param: name.to_string(),
            reason: format!("expected a string, got {}", other),
        }),
    }
}

/// Prepend `prefix` to a string or numeric identifier.
pub fn format_id(value: Value, params: &Params) -> Result<Value, ActionError> {
    let prefix = string_param(params, "prefix", "")?;
    let id = match &value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(ActionError::InvalidInput(format!(
                "format_id expects a string or number, got {}",
                other
            )))
        }
    };
    Ok(Value::String(format!("{}{}", prefix, id)))
}

/// Strip markup, joining the remaining text runs with a single space.
pub fn clean_html(value: Value, _params: &Params) -> Result<Value, ActionError> {
    let html = expect_str(&value, "clean_html")?;
    let without_scripts = SCRIPT_RE.replace_all(html, "");
    let text = TAG_RE
        .split(&without_scripts)
        .filter(|run| !run.is_empty())
        .map(decode_entities)
        .collect::<Vec<_>>()
        .join(" ");
    Ok(Value::String(text))
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", "\u{a0}")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Normalize a personal name to `"First Last"`.
///
/// Accepts `"Last, First [Middle]"` and `"[Title] First [Middle...] Last [Suffix]"`.
/// Titles (`Dr.`) and suffixes (`Jr.`, `PhD`) are dropped.
pub fn format_name(value: Value, _params: &Params) -> Result<Value, ActionError> {
    let raw = expect_str(&value, "format_name")?;

    let (head, tail) = raw.split_once(',').unwrap_or((raw, ""));
    // "John Smith, Jr." carries only suffixes after the comma
    let suffix_tail = name_words(tail).all(|word| is_name_suffix(word));

    let (first, last) = if suffix_tail {
        let parts: Vec<&str> = name_words(head)
            .skip_while(|word| is_name_title(word))
            .collect();
        let end = parts
            .iter()
            .rposition(|word| !is_name_suffix(word))
            .map_or(0, |pos| pos + 1);
        match &parts[..end] {
            [] => ("", ""),
            [only] => (*only, ""),
            [first, .., last] => (*first, *last),
        }
    } else {
        let first = name_words(tail)
            .find(|word| !is_name_title(word) && !is_name_suffix(word))
            .unwrap_or_default();
        let last = name_words(head)
            .filter(|word| !is_name_suffix(word))
            .last()
            .unwrap_or_default();
        (first, last)
    };

    Ok(Value::String(format!("{} {}", first, last).trim().to_string()))
}

fn name_words<'a>(text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|word| !word.is_empty())
}

fn name_key(word: &str) -> String {
    word.trim_end_matches('.').replace('.', "").to_lowercase()
}

fn is_name_title(word: &str) -> bool {
    NAME_TITLES.contains(&name_key(word).as_str())
}

fn is_name_suffix(word: &str) -> bool {
    NAME_SUFFIXES.contains(&name_key(word).as_str())
}

/// Split a string into a list of tags. Empty pieces are kept.
pub fn format_tags(value: Value, params: &Params) -> Result<Value, ActionError> {
    let separator = string_param(params, "separator", " ")?;
    if separator.is_empty() {
        return Err(ActionError::InvalidParam {
            param: "separator".to_string(),
            reason: "empty separator".to_string(),
        });
    }
    let text = expect_str(&value, "format_tags")?;
    let tags = text
        .split(separator)
        .map(|tag| Value::String(tag.to_string()))
        .collect();
    Ok(Value::Array(tags))
}

/// Tokenize the text and drop English stopwords (case-sensitive match).
pub fn remove_stopwords(value: Value, _params: &Params) -> Result<Value, ActionError> {
    let text = expect_str(&value, "remove_stopwords")?;
    let kept = TOKEN_RE
        .find_iter(text)
        .map(|token| token.as_str())
        .filter(|token| !STOPWORDS.contains(token))
        .collect::<Vec<_>>()
        .join(" ");
    Ok(Value::String(kept))
}

/// Entity extraction hook. Returns the value unchanged.
pub fn extract_entities(value: Value, _params: &Params) -> Result<Value, ActionError> {
    Ok(value)
}
