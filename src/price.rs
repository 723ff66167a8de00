//! Display-price strings ("AED 1.2M", "AED 850K") as stored on areas and projects.
//!
//! `parse_display_price` must agree with the `parse_display_price(text)` SQL
//! function behind the `area_stats` view.

const MILLION: i64 = 1_000_000;
const THOUSAND: i64 = 1_000;
const CURRENCY_TAGS: [&str; 3] = ["AED", "DHS", "DH"];

/// Characters dropped before parsing. Same set as the `[...]` class in the SQL
/// function: ASCII whitespace, no-break spaces and the thousands comma.
const SEPARATORS: [char; 9] = [' ', '\t', '\n', '\r', '\x0B', '\x0C', '\u{a0}', '\u{202f}', ','];

/// Parse a display price into whole AED. Returns `None` for anything that is not
/// `[currency] <digits>[.<digits>][M|K]` once separators are removed.
pub fn parse_display_price(raw: &str) -> Option<i64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !SEPARATORS.contains(c))
        .collect::<String>()
        .to_ascii_uppercase();

    let amount = CURRENCY_TAGS
        .iter()
        .find_map(|tag| cleaned.strip_prefix(tag))
        .unwrap_or(&cleaned);

    let (number, multiplier) = if let Some(n) = amount.strip_suffix('M') {
        (n, MILLION)
    } else if let Some(n) = amount.strip_suffix('K') {
        (n, THOUSAND)
    } else {
        (amount, 1)
    };

    let (whole, fraction) = match number.split_once('.') {
        Some((w, f)) => (w, f),
        None => (number, ""),
    };
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if number.contains('.') && (fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }

    let whole_value = whole.parse::<i64>().ok()?.checked_mul(multiplier)?;
    whole_value.checked_add(scale_fraction(fraction, multiplier)?)
}

/// Exact `0.<fraction> * multiplier`, rounded half-up like Postgres `round()`.
fn scale_fraction(fraction: &str, multiplier: i64) -> Option<i64> {
    if fraction.is_empty() {
        return Some(0);
    }
    // Digits beyond the multiplier's precision (plus one for rounding) cannot matter.
    let keep = fraction.len().min(19);
    let digits = &fraction[..keep];
    let numerator = digits.parse::<i128>().ok()?;
    let denominator = 10i128.checked_pow(keep as u32)?;
    let scaled = numerator.checked_mul(multiplier as i128)?;
    let rounded = (scaled * 2 + denominator) / (denominator * 2);
    i64::try_from(rounded).ok()
}

/// Render whole AED the way the catalogue writes prices: "AED 1.2M", "AED 850K".
pub fn format_display_price(amount: i64) -> String {
    if amount >= MILLION {
        format!("AED {}M", trim_decimal(amount, MILLION))
    } else if amount >= THOUSAND {
        format!("AED {}K", trim_decimal(amount, THOUSAND))
    } else {
        format!("AED {}", amount)
    }
}

// Two decimal places at most, trailing zeros removed.
fn trim_decimal(amount: i64, unit: i64) -> String {
    let hundredths = (amount as i128 * 100 + unit as i128 / 2) / unit as i128;
    let whole = hundredths / 100;
    let frac = hundredths % 100;
    match frac {
        0 => whole.to_string(),
        f if f % 10 == 0 => format!("{}.{}", whole, f / 10),
        f => format!("{}.{:02}", whole, f),
    }
}
