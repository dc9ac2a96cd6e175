use std::sync::LazyLock;

use regex::Regex;

static NON_NUMERIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^0-9.\-]").unwrap());

/// Strip everything but digits, one `.` and a leading `-`.
///
/// Only the first `.` survives. A `-` survives only when it is the very
/// first character of `raw`; interior minus signs are dropped.
pub fn sanitize_numeric_text(raw: &str) -> String {
    let stripped = NON_NUMERIC.replace_all(raw, "");
    let mut cleaned = String::with_capacity(stripped.len());
    if raw.starts_with('-') {
        cleaned.push('-');
    }

    let mut seen_dot = false;
    for c in stripped.chars() {
        match c {
            '-' => {}
            '.' if seen_dot => {}
            '.' => {
                seen_dot = true;
                cleaned.push(c);
            }
            _ => cleaned.push(c),
        }
    }
    cleaned
}

/// Parse user text as a finite number. `None` when nothing numeric is left.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let cleaned = sanitize_numeric_text(raw);
    if matches!(cleaned.as_str(), "" | "-" | ".") {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Fractional digits in the sanitized text, ignoring trailing zeros.
///
/// `"12.50"` has one place, `"3.000"` and `"7"` have none.
pub fn decimal_places(raw: &str) -> u32 {
    let cleaned = sanitize_numeric_text(raw);
    match cleaned.split_once('.') {
        Some((_, fraction)) => fraction.trim_end_matches('0').len() as u32,
        None => 0,
    }
}
