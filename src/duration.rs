//! Video durations are integer seconds everywhere inside the crate.
//! Clock strings (`"H:MM:SS"` / `"MM:SS"`) and total strings (`"1h 20m"`)
//! exist only at the HTTP boundary.

/// Parses a duration in `H:MM:SS`, `MM:SS`, or bare-seconds form.
///
/// Unparseable input counts as zero rather than failing the whole
/// aggregation.
pub fn parse(text: &str) -> u64 {
    let parts: Vec<&str> = text.split(':').collect();

    let nums: Option<Vec<u64>> = parts.iter().map(|p| p.trim().parse().ok()).collect();

    match nums.as_deref() {
        Some(&[h, m, s]) => h * 3600 + m * 60 + s,
        Some(&[m, s]) => m * 60 + s,
        _ => text.trim().parse().unwrap_or(0),
    }
}

/// Sums a sequence of boundary duration strings into seconds.
pub fn total<I, S>(durations: I) -> u64
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    durations.into_iter().map(|d| parse(d.as_ref())).sum()
}

/// Formats a total as `"XhYm"` when at least an hour, else `"Ym"`.
pub fn format_total(seconds: u64) -> String {
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;

    if h > 0 {
        format!("{}h {}m", h, m)
    } else {
        format!("{}m", m)
    }
}

/// Formats seconds as a clock string: `"H:MM:SS"` past an hour, `"MM:SS"`
/// otherwise.
pub fn format_clock(seconds: u64) -> String {
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;

    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_forms() {
        assert_eq!(parse("1:00:00"), 3600);
        assert_eq!(parse("1:30"), 90);
        assert_eq!(parse("0:30"), 30);
        assert_eq!(parse("90"), 90);
        assert_eq!(parse("junk"), 0);
        assert_eq!(parse("1:junk"), 0);
    }

    #[test]
    fn empty_sequence_is_zero_minutes() {
        assert_eq!(format_total(total(Vec::<String>::new())), "0m");
    }

    #[test]
    fn sums_mixed_clock_strings() {
        assert_eq!(format_total(total(["0:30", "1:00"])), "1m");
        assert_eq!(format_total(total(["1:00:00"])), "1h 0m");
        assert_eq!(format_total(total(["45:00", "30:00"])), "1h 15m");
    }

    #[test]
    fn aggregation_is_idempotent() {
        let once = total(["12:34", "0:26"]);
        let twice = total(["12:34", "0:26"]);
        assert_eq!(once, twice);
        assert_eq!(once, 780);
    }

    #[test]
    fn clock_round_trip() {
        assert_eq!(format_clock(3661), "1:01:01");
        assert_eq!(format_clock(754), "12:34");
        assert_eq!(format_clock(8), "0:08");
        assert_eq!(parse(&format_clock(3661)), 3661);
    }
}
