use super::NodeId;
use regex::{Regex, RegexBuilder};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid pattern flag '{0}'")]
    UnknownFlag(char),
    #[error("duplicate pattern flag '{0}'")]
    DuplicateFlag(char),
    #[error("pattern flags 'u' and 'v' cannot be combined")]
    UnicodeModeConflict,
    #[error("invalid pattern source: {0}")]
    Syntax(#[from] regex::Error),
}

/// Parsed pattern flags.
///
/// Only `i`, `m` and `s` change how the pattern matches; `g` and `y` drive
/// [`Pattern::find_next`]; the rest are carried along.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatternFlags {
    pub has_indices: bool,
    pub global: bool,
    pub ignore_case: bool,
    pub multiline: bool,
    pub dot_all: bool,
    pub unicode: bool,
    pub unicode_sets: bool,
    pub sticky: bool,
}

impl PatternFlags {
    pub fn parse(flags: &str) -> Result<Self, PatternError> {
        let mut out = Self::default();
        for ch in flags.chars() {
            let slot = match ch {
                'd' => &mut out.has_indices,
                'g' => &mut out.global,
                'i' => &mut out.ignore_case,
                'm' => &mut out.multiline,
                's' => &mut out.dot_all,
                'u' => &mut out.unicode,
                'v' => &mut out.unicode_sets,
                'y' => &mut out.sticky,
                _ => return Err(PatternError::UnknownFlag(ch)),
            };
            if *slot {
                return Err(PatternError::DuplicateFlag(ch));
            }
            *slot = true;
        }
        if out.unicode && out.unicode_sets {
            return Err(PatternError::UnicodeModeConflict);
        }
        Ok(out)
    }
}

/// Canonical order: `dgimsuvy`.
impl fmt::Display for PatternFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = [
            (self.has_indices, 'd'),
            (self.global, 'g'),
            (self.ignore_case, 'i'),
            (self.multiline, 'm'),
            (self.dot_all, 's'),
            (self.unicode, 'u'),
            (self.unicode_sets, 'v'),
            (self.sticky, 'y'),
        ];
        for (on, ch) in table {
            if on {
                write!(f, "{ch}")?;
            }
        }
        Ok(())
    }
}

struct PatternData {
    source: String,
    flags: PatternFlags,
    regex: Regex,
    last_index: Cell<usize>,
}

/// A text pattern: source text, flags and a mutable search cursor.
///
/// # Examples
///
/// ```
/// use grabbag_util::value::Pattern;
///
/// let pattern = Pattern::new("h(a)+", "gi").unwrap();
/// assert_eq!(pattern.flags(), "gi");
/// assert!(pattern.is_match("HAHA"));
/// ```
#[derive(Clone)]
pub struct Pattern(Rc<PatternData>);

impl Pattern {
    pub fn new(source: &str, flags: &str) -> Result<Self, PatternError> {
        let flags = PatternFlags::parse(flags)?;
        let regex = RegexBuilder::new(source)
            .case_insensitive(flags.ignore_case)
            .multi_line(flags.multiline)
            .dot_matches_new_line(flags.dot_all)
            .build()?;
        Ok(Self::from_parts(source.to_string(), flags, regex))
    }

    fn from_parts(source: String, flags: PatternFlags, regex: Regex) -> Self {
        Pattern(Rc::new(PatternData {
            source,
            flags,
            regex,
            last_index: Cell::new(0),
        }))
    }

    /// A fresh pattern with the same source and flags and its cursor at 0.
    pub fn duplicate(&self) -> Self {
        Self::from_parts(self.0.source.clone(), self.0.flags, self.0.regex.clone())
    }

    pub fn id(&self) -> NodeId {
        NodeId::of(&self.0)
    }

    pub fn source(&self) -> &str {
        &self.0.source
    }

    pub fn flags(&self) -> String {
        self.0.flags.to_string()
    }

    pub fn pattern_flags(&self) -> PatternFlags {
        self.0.flags
    }

    pub fn regex(&self) -> &Regex {
        &self.0.regex
    }

    /// Byte offset where the next global or sticky search starts.
    pub fn last_index(&self) -> usize {
        self.0.last_index.get()
    }

    pub fn set_last_index(&self, index: usize) {
        self.0.last_index.set(index);
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.regex.is_match(text)
    }

    /// Find the next match as a byte range.
    ///
    /// Global and sticky patterns search from [`last_index`](Self::last_index)
    /// and advance it; a sticky pattern only matches right at the cursor.
    /// A failed search resets the cursor to 0.
    pub fn find_next(&self, text: &str) -> Option<(usize, usize)> {
        let flags = self.0.flags;
        if !flags.global && !flags.sticky {
            return self.0.regex.find(text).map(|m| (m.start(), m.end()));
        }
        let start = self.last_index();
        let found = if start > text.len() {
            None
        } else {
            self.0
                .regex
                .find_at(text, start)
                .filter(|m| !flags.sticky || m.start() == start)
        };
        match found {
            Some(m) => {
                self.set_last_index(m.end());
                Some((m.start(), m.end()))
            }
            None => {
                self.set_last_index(0);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_round_trip_in_canonical_order() {
        let pattern = Pattern::new("a", "ymig").unwrap();
        assert_eq!(pattern.flags(), "gimy");
    }

    #[test]
    fn test_unknown_flag() {
        assert!(matches!(
            Pattern::new("a", "q"),
            Err(PatternError::UnknownFlag('q'))
        ));
    }

    #[test]
    fn test_duplicate_flag() {
        assert!(matches!(
            Pattern::new("a", "gg"),
            Err(PatternError::DuplicateFlag('g'))
        ));
    }

    #[test]
    fn test_unicode_conflict() {
        assert!(matches!(
            Pattern::new("a", "uv"),
            Err(PatternError::UnicodeModeConflict)
        ));
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(Pattern::new("(", ""), Err(PatternError::Syntax(_))));
    }

    #[test]
    fn test_flags_affect_matching() {
        assert!(Pattern::new("abc", "i").unwrap().is_match("ABC"));
        assert!(!Pattern::new("abc", "").unwrap().is_match("ABC"));
        assert!(Pattern::new("^b$", "m").unwrap().is_match("a\nb\nc"));
        assert!(Pattern::new("a.b", "s").unwrap().is_match("a\nb"));
    }

    #[test]
    fn test_global_search_advances_cursor() {
        let pattern = Pattern::new("o", "g").unwrap();
        assert_eq!(pattern.find_next("foo"), Some((1, 2)));
        assert_eq!(pattern.last_index(), 2);
        assert_eq!(pattern.find_next("foo"), Some((2, 3)));
        assert_eq!(pattern.find_next("foo"), None);
        assert_eq!(pattern.last_index(), 0);
    }

    #[test]
    fn test_sticky_search_anchors_at_cursor() {
        let pattern = Pattern::new("o", "y").unwrap();
        assert_eq!(pattern.find_next("fo"), None);
        pattern.set_last_index(1);
        assert_eq!(pattern.find_next("fo"), Some((1, 2)));
    }

    #[test]
    fn test_duplicate_resets_cursor() {
        let pattern = Pattern::new("o", "g").unwrap();
        pattern.find_next("foo");
        let copy = pattern.duplicate();
        assert_eq!(copy.last_index(), 0);
        assert_eq!(copy.source(), "o");
        assert_eq!(copy.flags(), "g");
        assert_ne!(copy.id(), pattern.id());
    }
}
