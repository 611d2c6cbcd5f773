//! Note token normalization
//!
//! Tokens are compared after upper-casing and dropping everything that is not
//! a letter, `#` or `-`. That keeps sharps (`C#`), flats spelled with a
//! trailing `B` (`EB`) and hyphenated qualifiers (`E-HALF-FLAT`).

/// Canonical form of a raw note token
///
/// Pure, total and idempotent. An empty token normalizes to `""`.
pub fn normalize_note(raw: &str) -> String {
    raw.to_uppercase()
        .chars()
        .filter(|c| c.is_alphabetic() || *c == '#' || *c == '-')
        .collect::<String>()
        .trim()
        .to_string()
}
