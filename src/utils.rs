use chrono::{Datelike, NaiveDate};

/// Lowercase ASCII slug: alphanumerics kept, every other run collapsed to one `-`.
/// "Dubai Marina" and "dubai-marina" both become `dubai-marina`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Trim a submitted value; blank strings count as absent.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
    })
}

/// Monthly reporting rows are keyed by the first day of their month.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Clamp an optional query parameter into `[min, max]`, falling back to `default`.
pub fn clamp_or(value: Option<i64>, default: i64, min: i64, max: i64) -> i64 {
    value.unwrap_or(default).clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Dubai Marina"), "dubai-marina");
        assert_eq!(slugify("dubai-marina"), "dubai-marina");
        assert_eq!(slugify("  Jumeirah Village Circle (JVC) "), "jumeirah-village-circle-jvc");
        assert_eq!(slugify("Emaar Properties, PJSC"), "emaar-properties-pjsc");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn non_blank_trims() {
        assert_eq!(non_blank(Some("  +971 50 000 0000 ".into())), Some("+971 50 000 0000".into()));
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn first_of_month_normalises() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 17).unwrap();
        assert_eq!(first_of_month(d), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
    }

    #[test]
    fn clamp_or_bounds() {
        assert_eq!(clamp_or(None, 20, 1, 100), 20);
        assert_eq!(clamp_or(Some(0), 20, 1, 100), 1);
        assert_eq!(clamp_or(Some(500), 20, 1, 100), 100);
        assert_eq!(clamp_or(Some(35), 20, 1, 100), 35);
    }
}
