use chrono::{SecondsFormat, Utc};
use regex::Regex;
use std::sync::OnceLock;

fn br_pattern() -> &'static Regex {
    static BR: OnceLock<Regex> = OnceLock::new();
    BR.get_or_init(|| Regex::new(r"<br\s*/?>").expect("valid <br> pattern"))
}

/// Escape a plain-text value for inclusion in HTML text or attribute context.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// `<br>`, `<br/>` and `<br />` become newlines.
pub fn br_to_newline(input: &str) -> String {
    br_pattern().replace_all(input, "\n").into_owned()
}

pub fn newline_to_br(input: &str) -> String {
    input.replace('\n', "<br>")
}

/// Slugify a page name for use as its public path segment
pub fn slugify(input: &str) -> String {
    slug::slugify(input)
}

/// Current UTC time in the ISO-8601 form used by every persisted timestamp.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn new_block_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn new_asset_id(prefix: &str) -> String {
    format!("{prefix}_{}", nanoid::nanoid!(10))
}
