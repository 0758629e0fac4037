use crate::random::RandomSource;
use rand::Rng;

/// Median of the values; 0 for an empty slice.
///
/// # Examples
///
/// ```
/// use grabbag_util::number::median;
///
/// assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
/// assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
/// ```
pub fn median(nums: &[f64]) -> f64 {
    if nums.is_empty() {
        return 0.0;
    }
    let mut sorted = nums.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// Arithmetic mean; 0 for an empty slice.
pub fn average(nums: &[f64]) -> f64 {
    if nums.is_empty() {
        return 0.0;
    }
    nums.iter().sum::<f64>() / nums.len() as f64
}

pub fn in_range(n: f64, min: f64, max: f64, inclusive: bool) -> bool {
    if inclusive {
        n >= min && n <= max
    } else {
        n > min && n < max
    }
}

/// Linear interpolation between `a` and `b`.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Format with a comma between each group of three integer digits.
///
/// Magnitudes of `1e21` and above, and below `1e-6`, use exponent notation
/// as JavaScript's `Number#toString` does, without grouping.
///
/// # Examples
///
/// ```
/// use grabbag_util::number::format_number;
///
/// assert_eq!(format_number(1234567.0), "1,234,567");
/// assert_eq!(format_number(-9876.54321), "-9,876.54321");
/// ```
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    // -0 prints as "0"
    let n = if n == 0.0 { 0.0 } else { n };
    let magnitude = n.abs();
    if magnitude >= 1e21 || (magnitude != 0.0 && magnitude < 1e-6) {
        return exponent_form(n);
    }
    let text = n.to_string();
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    match unsigned.split_once('.') {
        Some((int, frac)) => format!("{sign}{}.{frac}", group_thousands(int)),
        None => format!("{sign}{}", group_thousands(unsigned)),
    }
}

// `1.5e21` -> `1.5e+21`, `1e-7` stays as is.
fn exponent_form(n: f64) -> String {
    let text = format!("{n:e}");
    match text.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => text,
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Random integer in `[min, max]` from the thread-local RNG; the bounds may
/// come in either order.
pub fn random_int(min: i64, max: i64) -> i64 {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    rand::thread_rng().gen_range(lo..=hi)
}

pub fn random_int_with(source: &RandomSource, min: i64, max: i64) -> i64 {
    source.int_in(min, max)
}
