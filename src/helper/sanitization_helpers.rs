use regex::Regex;
use std::sync::OnceLock;

fn non_slug_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("static regex"))
}

/// URL slug from a display name: lowercase ASCII letters and digits, with
/// every other run of characters collapsed into a single hyphen.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    non_slug_chars()
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Textareas post CRLF line endings; store LF only.
pub fn normalize_newlines(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}
