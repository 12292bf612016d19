use std::sync::LazyLock;

use chrono::TimeDelta;
use regex::Regex;

static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)\s*([мчд])$").unwrap());

/// Parse a compact window token such as `30м`, `2ч` or `1д`.
///
/// Returns `None` for anything that is not ASCII digits plus a single unit,
/// and for counts too large to express as a span.
pub fn parse_duration(token: &str) -> Option<TimeDelta> {
    let token = token.trim().to_lowercase();
    let caps = DURATION_RE.captures(&token)?;
    let value: i64 = caps[1].parse().ok()?;
    match &caps[2] {
        "м" => TimeDelta::try_minutes(value),
        "ч" => TimeDelta::try_hours(value),
        "д" => TimeDelta::try_days(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units() {
        assert_eq!(parse_duration("30м"), Some(TimeDelta::minutes(30)));
        assert_eq!(parse_duration("2ч"), Some(TimeDelta::hours(2)));
        assert_eq!(parse_duration("1д"), Some(TimeDelta::days(1)));
    }

    #[test]
    fn rejects_bad_shapes() {
        for bad in ["abc", "5", "м", "5x", "5мм", "5м ago", "-5м", "5.5ч", "３ч", ""] {
            assert_eq!(parse_duration(bad), None, "{bad:?} should not parse");
        }
    }

    #[test]
    fn trims_and_lowercases() {
        assert_eq!(parse_duration("  3Ч "), Some(TimeDelta::hours(3)));
        assert_eq!(parse_duration("3 ч"), Some(TimeDelta::hours(3)));
    }

    #[test]
    fn zero_is_a_valid_span() {
        assert_eq!(parse_duration("0м"), Some(TimeDelta::zero()));
    }

    #[test]
    fn overflow_is_rejected() {
        assert_eq!(parse_duration("99999999999999999999д"), None);
        assert_eq!(parse_duration("9999999999999д"), None);
    }
}
