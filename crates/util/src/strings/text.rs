/// Trim and collapse every run of whitespace into a single space.
///
/// # Examples
///
/// ```
/// use grabbag_util::strings::normalize_whitespace;
///
/// assert_eq!(normalize_whitespace("  a \t b\n\nc  "), "a b c");
/// ```
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Upper-case the first character, leaving the rest untouched.
///
/// # Examples
///
/// ```
/// use grabbag_util::strings::capitalize;
///
/// assert_eq!(capitalize("hello world"), "Hello world");
/// assert_eq!(capitalize(""), "");
/// ```
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
