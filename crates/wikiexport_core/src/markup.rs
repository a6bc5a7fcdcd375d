use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::model::source_ids;

pub const LINK_PATTERN: &str = r"\[\[(?<name>[^|#\]]+)(?<anchor>#[^|\]]+)?(\|(?<title>[^\]]+))?\]\]";

pub static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(LINK_PATTERN).expect("valid link regex"));

pub static LINK_ONLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{LINK_PATTERN}$")).expect("valid link-only regex")
});

static EMPHASIS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("'{2,3}").expect("valid emphasis regex"));

static SQUARE_SNIPPET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\{s:c\}").expect("valid square snippet regex"));

const SOURCE_SNIPPETS: [(&str, &str); 3] = [
    ("{s:uc}", source_ids::ULTIMATE_COMBAT),
    ("{s:um}", source_ids::ULTIMATE_MAGIC),
    ("{s:apg}", source_ids::ADVANCED_PLAYERS_GUIDE),
];

/// Strips links (keeping the title or target), bold/italic quotes and square snippets.
pub fn remove_markup(markup: &str) -> String {
    let text = LINK_RE.replace_all(markup, |captures: &Captures| link_title(captures).to_string());
    let text = EMPHASIS_RE.replace_all(&text, "");
    SQUARE_SNIPPET_RE.replace_all(&text, "c").into_owned()
}

/// Title of a link capture, falling back to its target.
pub fn link_title<'a>(captures: &Captures<'a>) -> &'a str {
    captures
        .name("title")
        .map(|value| value.as_str())
        .filter(|value| !value.is_empty())
        .or_else(|| captures.name("name").map(|value| value.as_str()))
        .unwrap_or("")
}

/// Target of a link capture, falling back to its title.
pub fn link_target<'a>(captures: &Captures<'a>) -> &'a str {
    captures
        .name("name")
        .map(|value| value.as_str())
        .filter(|value| !value.is_empty())
        .or_else(|| captures.name("title").map(|value| value.as_str()))
        .unwrap_or("")
}

pub fn detect_source_snippet(markup: &str) -> Option<&'static str> {
    let lower = markup.to_lowercase();
    SOURCE_SNIPPETS
        .iter()
        .find(|(snippet, _)| lower.contains(snippet))
        .map(|(_, source)| *source)
}

/// Replaces typographic apostrophes with the ascii one.
pub fn plain_apostrophes(value: &str) -> String {
    value.replace('’', "'")
}

#[cfg(test)]
mod tests {
    use super::{
        LINK_ONLY_RE, detect_source_snippet, link_target, remove_markup,
    };

    #[test]
    fn remove_markup_keeps_link_titles_and_drops_emphasis() {
        assert_eq!(
            remove_markup("'''Portée''' [[présentation des sorts#portee|contact]] et [[illimitée]]"),
            "Portée contact et illimitée"
        );
        assert_eq!(remove_markup("5 {s:c} + 1 {S:C}/2 niveaux"), "5 c + 1 c/2 niveaux");
    }

    #[test]
    fn link_only_pattern_exposes_target_and_title() {
        let captures = LINK_ONLY_RE
            .captures("[[arme de prédilection#note|Arme de prédilection]]")
            .expect("link");
        assert_eq!(link_target(&captures), "arme de prédilection");
        assert_eq!(&captures["anchor"], "#note");
        assert!(LINK_ONLY_RE.captures("[[a]] et [[b]]").is_none());
    }

    #[test]
    fn detect_source_snippet_is_case_insensitive() {
        assert_eq!(detect_source_snippet("{s:uc} blah"), Some("ultimate-combat"));
        assert_eq!(detect_source_snippet("x {S:UM}"), Some("ultimate-magic"));
        assert_eq!(detect_source_snippet("{s:APG}"), Some("advanced-players-guide"));
        assert_eq!(detect_source_snippet("{s:c}"), None);
    }
}
