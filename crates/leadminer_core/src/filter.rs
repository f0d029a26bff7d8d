use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Free-mail providers whose addresses are never treated as leads.
pub const GENERIC_EMAIL_DOMAINS: [&str; 5] = [
    "gmail.com",
    "yahoo.com",
    "outlook.com",
    "hotmail.com",
    "icloud.com",
];

/// Explicit scheme, bare `www.`, or a bare domain on one of the known TLDs.
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)https?://\S+|www\.\S+|\b[a-z0-9-]+(?:\.[a-z0-9-]+)*\.(?:com|net|org|io|gov|biz|me|co|info|edu)\b",
    )
    .expect("url pattern is valid")
});

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@([A-Za-z0-9.-]+\.[A-Za-z]{2,})").expect("email pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Keep every non-blank line.
    NoFilter,
    /// Keep lines carrying a URL or bare domain.
    UrlsOnly,
    /// Keep lines carrying a URL or a non-generic e-mail address.
    #[default]
    LeadsOnly,
}

impl FilterMode {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterMode::NoFilter => "no_filter",
            FilterMode::UrlsOnly => "urls_only",
            FilterMode::LeadsOnly => "leads_only",
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter mode {0:?}")]
pub struct ParseFilterModeError(pub String);

impl FromStr for FilterMode {
    type Err = ParseFilterModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "no_filter" | "raw_mode" => Ok(FilterMode::NoFilter),
            "urls_only" => Ok(FilterMode::UrlsOnly),
            "leads_only" => Ok(FilterMode::LeadsOnly),
            other => Err(ParseFilterModeError(other.to_string())),
        }
    }
}

/// Decide whether a single line survives the given filter mode.
///
/// Blank and whitespace-only lines never survive.
pub fn classify(line: &str, mode: FilterMode) -> bool {
    if line.trim().is_empty() {
        return false;
    }
    match mode {
        FilterMode::NoFilter => true,
        FilterMode::UrlsOnly => contains_url(line),
        FilterMode::LeadsOnly => {
            contains_url(line)
                || email_domains(line).any(|domain| !is_generic_email_domain(domain))
        }
    }
}

/// True when `text` holds a scheme URL, a `www.` host or a bare domain.
///
/// A domain that is part of an e-mail address (`@` on either side) does not count.
pub fn contains_url(text: &str) -> bool {
    URL_PATTERN.find_iter(text).any(|m| {
        let before = text[..m.start()].chars().next_back();
        let after = text[m.end()..].chars().next();
        before != Some('@') && after != Some('@')
    })
}

/// Domains of every e-mail address found in `text`, in order of appearance.
pub fn email_domains(text: &str) -> impl Iterator<Item = &str> {
    EMAIL_PATTERN
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}

pub fn is_generic_email_domain(domain: &str) -> bool {
    GENERIC_EMAIL_DOMAINS
        .iter()
        .any(|generic| domain.eq_ignore_ascii_case(generic))
}

/// Keep the lines of `text` that survive `mode`, trimmed and joined by `\n`.
pub fn filter_text(text: &str, mode: FilterMode) -> String {
    text.lines()
        .filter(|line| classify(line, mode))
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
}
