//! Raw form input normalization.
//!
//! # Responsibility
//! - Reduce submitted text to a single plain-text line.
//! - Reduce submitted email to a normalized address or an empty string.
//! - Coerce submitted identifiers to integers.
//!
//! # Invariants
//! - Sanitizers never fail; unusable input collapses to `""` or `0`.
//! - Output escaping is still required; sanitized text may contain `<`.

use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_STYLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script[^>]*?>.*?</script>|<style[^>]*?>.*?</style>")
        .expect("valid script/style regex")
});
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\r\n\t ]+").expect("valid whitespace regex"));
static OCTET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)%[a-f0-9]{2}").expect("valid octet regex"));
static SPACES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").expect("valid spaces regex"));
static EMAIL_LOCAL_STRIP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^a-zA-Z0-9!#$%&'*+/=?^_`{|}~.-]").expect("valid local-part regex")
});
static EMAIL_LABEL_STRIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[^a-z0-9-]+").expect("valid label regex"));

const MIN_EMAIL_BYTES: usize = 6;

/// Sanitizes a single-line plain-text field.
///
/// Rules, in order:
/// - `<script>`/`<style>` blocks are removed with their content.
/// - Remaining tags are removed.
/// - Runs of spaces, tabs and line breaks collapse to one space.
/// - Percent-encoded octets (`%XX`) are removed until none remain.
/// - Result is trimmed.
pub fn sanitize_text_field(raw: &str) -> String {
    let mut filtered = raw.to_string();
    if filtered.contains('<') {
        filtered = SCRIPT_STYLE_RE.replace_all(&filtered, "").into_owned();
        filtered = TAG_RE.replace_all(&filtered, "").into_owned();
    }
    filtered = WHITESPACE_RE.replace_all(&filtered, " ").trim().to_string();

    let mut found_octets = false;
    while OCTET_RE.is_match(&filtered) {
        filtered = OCTET_RE.replace_all(&filtered, "").into_owned();
        found_octets = true;
    }
    if found_octets {
        filtered = SPACES_RE.replace_all(&filtered, " ").trim().to_string();
    }

    filtered
}

/// Sanitizes an email address, returning `""` when nothing usable remains.
///
/// The local part keeps only RFC 5322 atom characters and dots. The domain
/// keeps at least two labels of `[A-Za-z0-9-]`.
pub fn sanitize_email(raw: &str) -> String {
    if raw.len() < MIN_EMAIL_BYTES {
        return String::new();
    }
    if !raw.char_indices().skip(1).any(|(_, ch)| ch == '@') {
        return String::new();
    }
    let Some((local, domain)) = raw.split_once('@') else {
        return String::new();
    };

    let local = EMAIL_LOCAL_STRIP_RE.replace_all(local, "");
    if local.is_empty() {
        return String::new();
    }

    if domain.contains("..") {
        return String::new();
    }
    let domain = domain.trim_matches(|ch| is_trim_space(ch) || ch == '.');
    if domain.is_empty() {
        return String::new();
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return String::new();
    }

    let cleaned: Vec<String> = labels
        .into_iter()
        .map(|label| label.trim_matches(|ch| is_trim_space(ch) || ch == '-'))
        .map(|label| EMAIL_LABEL_STRIP_RE.replace_all(label, "").into_owned())
        .filter(|label| !label.is_empty())
        .collect();
    if cleaned.len() < 2 {
        return String::new();
    }

    format!("{local}@{}", cleaned.join("."))
}

/// Coerces a submitted identifier like an integer cast.
///
/// Leading whitespace and one sign are accepted, then leading digits are
/// read. Anything unparseable is `0`; overflow saturates.
pub fn coerce_id(raw: &str) -> i64 {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let mut value: i64 = 0;
    for byte in digits.bytes().take_while(u8::is_ascii_digit) {
        let digit = i64::from(byte - b'0');
        value = value.saturating_mul(10).saturating_add(digit);
    }

    if negative {
        -value
    } else {
        value
    }
}

fn is_trim_space(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r' | '\0' | '\x0B')
}

#[cfg(test)]
mod tests {
    use super::{coerce_id, sanitize_email, sanitize_text_field};

    #[test]
    fn text_field_strips_tags_and_script_content() {
        assert_eq!(
            sanitize_text_field("<script>alert(1)</script>Jane <em>Doe</em>"),
            "Jane Doe"
        );
        assert_eq!(sanitize_text_field("<STYLE>p{}</STYLE>ok"), "ok");
    }

    #[test]
    fn text_field_collapses_whitespace_and_trims() {
        assert_eq!(sanitize_text_field("  Jane\t\n\r  Doe  "), "Jane Doe");
    }

    #[test]
    fn text_field_removes_percent_octets() {
        assert_eq!(sanitize_text_field("Jane%20Doe"), "JaneDoe");
        assert_eq!(sanitize_text_field("a %%4141 b"), "a b");
    }

    #[test]
    fn text_field_keeps_lone_angle_brackets_and_ampersands() {
        assert_eq!(sanitize_text_field("Tom & Jerry < Spike"), "Tom & Jerry < Spike");
    }

    #[test]
    fn email_is_normalized() {
        assert_eq!(sanitize_email("jane@example.com"), "jane@example.com");
        assert_eq!(sanitize_email(" ja(ne)@exa mple.com. "), "jane@example.com");
        assert_eq!(sanitize_email("jane@-sub-.example.com"), "jane@sub.example.com");
    }

    #[test]
    fn email_without_usable_parts_becomes_empty() {
        assert_eq!(sanitize_email("a@b.c"), "");
        assert_eq!(sanitize_email("@example.com"), "");
        assert_eq!(sanitize_email("jane.example.com"), "");
        assert_eq!(sanitize_email("jane@example..com"), "");
        assert_eq!(sanitize_email("jane@localhost"), "");
        assert_eq!(sanitize_email("()@example.com"), "");
        assert_eq!(sanitize_email("jane@!!.com"), "");
    }

    #[test]
    fn coerce_id_behaves_like_integer_cast() {
        assert_eq!(coerce_id("42"), 42);
        assert_eq!(coerce_id("  7abc"), 7);
        assert_eq!(coerce_id("+3"), 3);
        assert_eq!(coerce_id("-5"), -5);
        assert_eq!(coerce_id("abc"), 0);
        assert_eq!(coerce_id(""), 0);
        assert_eq!(coerce_id("99999999999999999999999"), i64::MAX);
    }
}
