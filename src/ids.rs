//! Record identifiers.
//!
//! Ids are `<prefix>_<ulid>` in lowercase, e.g. `tpl_01hqz3...`. Records
//! imported from older data keep whatever id they were stored with.

use ulid::Ulid;

use crate::error::{Error, Result};

pub const TEMPLATE_PREFIX: &str = "tpl";
pub const DAILY_PREFIX: &str = "day";
pub const RUN_PREFIX: &str = "run";

pub fn new_id(prefix: &str) -> String {
    format!("{prefix}_{}", Ulid::new().to_string().to_lowercase())
}

/// Resolve user input to one of `candidates`.
///
/// Accepts an exact id, or a case-insensitive prefix or suffix that matches
/// exactly one candidate (so the tail of a ulid is enough).
pub fn resolve_id<'a, I>(kind: &'static str, input: &str, candidates: I) -> Result<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        return Err(Error::InvalidArgument(format!("{kind} id cannot be empty")));
    }

    let mut matches = Vec::new();
    for candidate in candidates {
        if candidate == input.trim() {
            return Ok(candidate.to_string());
        }
        let lowered = candidate.to_lowercase();
        if lowered.starts_with(&needle) || lowered.ends_with(&needle) {
            matches.push(candidate);
        }
    }

    match matches.as_slice() {
        [] => Err(Error::NotFound {
            kind,
            id: input.to_string(),
        }),
        [only] => Ok(only.to_string()),
        many => Err(Error::InvalidArgument(format!(
            "{kind} id '{input}' is ambiguous ({} matches)",
            many.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_carry_prefix_and_are_unique() {
        let a = new_id(TEMPLATE_PREFIX);
        let b = new_id(TEMPLATE_PREFIX);
        assert!(a.starts_with("tpl_"));
        assert_eq!(a.len(), "tpl_".len() + 26);
        assert_eq!(a, a.to_lowercase());
        assert_ne!(a, b);
    }

    #[test]
    fn resolve_accepts_exact_prefix_and_suffix() {
        let ids = ["day_01aaaa", "day_01bbbb", "legacy-7"];
        assert_eq!(resolve_id("task", "legacy-7", ids).expect("exact"), "legacy-7");
        assert_eq!(resolve_id("task", "bbbb", ids).expect("suffix"), "day_01bbbb");
        assert_eq!(resolve_id("task", "LEG", ids).expect("prefix"), "legacy-7");
    }

    #[test]
    fn resolve_rejects_unknown_and_ambiguous() {
        let ids = ["day_01aaaa", "day_01bbbb"];
        assert!(matches!(
            resolve_id("task", "zzzz", ids),
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            resolve_id("task", "day_01", ids),
            Err(Error::InvalidArgument(_))
        ));
    }
}
