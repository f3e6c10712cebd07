use std::sync::OnceLock;

use regex::Regex;

const LINK_PATTERN: &str = r"(https?://[^\s]+|www\.[^\s]+|(?:[a-zA-Z0-9-]+\.)+[a-zA-Z]{2,})";

fn link_regex() -> &'static Regex {
    static LINK: OnceLock<Regex> = OnceLock::new();
    LINK.get_or_init(|| Regex::new(LINK_PATTERN).expect("link pattern is valid"))
}

/// Anything that looks like a URL or a bare domain.
pub fn contains_link(text: &str) -> bool {
    link_regex().is_match(&text.trim().to_lowercase())
}
