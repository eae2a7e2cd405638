use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Collapse every run of characters rejected by `keep` into a single hyphen,
/// lower-casing first and trimming hyphens from both ends.
fn collapse(input: &str, keep: impl Fn(char) -> bool) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for c in input.to_lowercase().chars() {
        if keep(c) && c != '-' {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    out
}

/// Sanitize a caller-supplied project slug.
///
/// Lower-cases, turns anything outside `[a-z0-9-]` into hyphens, collapses
/// hyphen runs and strips leading/trailing hyphens. May return an empty string.
pub fn sanitize_slug(input: &str) -> String {
    collapse(input, |c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Slugify free text: every run of non-alphanumeric characters becomes one hyphen.
pub fn slugify(input: &str) -> String {
    collapse(input, |c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

/// Parse a submitted date as a calendar date.
///
/// Accepts `YYYY-MM-DD`, a local `YYYY-MM-DDTHH:MM[:SS]` and RFC 3339. The
/// date is taken as written; no timezone conversion is applied.
pub fn parse_calendar_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .map(|dt| dt.date())
}

/// Identity of an update: `<YYYY-MM-DD>-<slugified english title>`.
///
/// Returns `None` when the title has no sluggable characters.
pub fn dated_identity(date: NaiveDate, title: &str) -> Option<String> {
    let title_slug = slugify(title);
    if title_slug.is_empty() {
        return None;
    }
    Some(format!("{}-{}", date.format("%Y-%m-%d"), title_slug))
}
