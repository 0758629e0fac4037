/// Join the present, non-empty parts with single spaces.
///
/// # Examples
///
/// ```
/// use grabbag_util::strings::class_names;
///
/// let active = true;
/// let disabled = false;
/// assert_eq!(
///     class_names([
///         Some("btn"),
///         active.then_some("btn-active"),
///         disabled.then_some("off"),
///         Some(""),
///     ]),
///     "btn btn-active"
/// );
/// ```
pub fn class_names<'a>(parts: impl IntoIterator<Item = Option<&'a str>>) -> String {
    parts
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
