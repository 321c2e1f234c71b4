//! String matching used by query conditions.
//!
//! Every matcher takes a [`Case`] flag. Case-insensitive comparison folds
//! both sides with Unicode lowercase mapping.
//!
//! # LIKE patterns
//!
//! - `*` matches zero or more characters
//! - `?` matches exactly one character

/// Case sensitivity of a string comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Case {
    #[default]
    Sensitive,
    Insensitive,
}

fn fold(value: &str, case: Case) -> String {
    match case {
        Case::Sensitive => value.to_string(),
        Case::Insensitive => value.to_lowercase(),
    }
}

/// String equality under the given case rule.
pub fn equals(value: &str, needle: &str, case: Case) -> bool {
    match case {
        Case::Sensitive => value == needle,
        Case::Insensitive => fold(value, case) == fold(needle, case),
    }
}

/// Substring test.
pub fn contains(value: &str, needle: &str, case: Case) -> bool {
    match case {
        Case::Sensitive => value.contains(needle),
        Case::Insensitive => fold(value, case).contains(&fold(needle, case)),
    }
}

/// Prefix test.
pub fn begins_with(value: &str, needle: &str, case: Case) -> bool {
    match case {
        Case::Sensitive => value.starts_with(needle),
        Case::Insensitive => fold(value, case).starts_with(&fold(needle, case)),
    }
}

/// Suffix test.
pub fn ends_with(value: &str, needle: &str, case: Case) -> bool {
    match case {
        Case::Sensitive => value.ends_with(needle),
        Case::Insensitive => fold(value, case).ends_with(&fold(needle, case)),
    }
}

/// Wildcard pattern matching.
///
/// ```
/// use strata_core::pattern_match::{like, Case};
/// assert!(like("hello", "h*o", Case::Sensitive));
/// assert!(like("hello", "?ello", Case::Sensitive));
/// assert!(like("HELLO", "h*", Case::Insensitive));
/// assert!(!like("hello", "world", Case::Sensitive));
/// ```
pub fn like(value: &str, pattern: &str, case: Case) -> bool {
    let v: Vec<char> = fold(value, case).chars().collect();
    let p: Vec<char> = fold(pattern, case).chars().collect();
    like_recursive(&v, &p, 0, 0)
}

fn like_recursive(v: &[char], p: &[char], vi: usize, pi: usize) -> bool {
    if pi == p.len() {
        return vi == v.len();
    }
    match p[pi] {
        '*' => (vi..=v.len()).any(|skip| like_recursive(v, p, skip, pi + 1)),
        '?' => vi < v.len() && like_recursive(v, p, vi + 1, pi + 1),
        ch => vi < v.len() && v[vi] == ch && like_recursive(v, p, vi + 1, pi + 1),
    }
}
