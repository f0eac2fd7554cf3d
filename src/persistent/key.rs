//! Sort-key extraction and case-insensitive key ordering.
//!
//! The ordered set never looks inside a record itself. It asks a
//! [`KeyExtractor`] for the string stored under a named field and orders
//! records by that string using [`compare_ignore_case`].
//!
//! # Examples
//!
//! ```rust
//! use persistent_history::persistent::{FieldLookup, KeyExtractor, compare_ignore_case};
//! use std::cmp::Ordering;
//! use std::collections::BTreeMap;
//!
//! let record = BTreeMap::from([("Id".to_string(), "b-7".to_string())]);
//! assert_eq!(FieldLookup.extract(&record, "id"), "b-7");
//!
//! let by_length = |record: &String, _field: &str| record.len().to_string();
//! assert_eq!(by_length.extract(&"four".to_string(), "ignored"), "4");
//!
//! assert_eq!(compare_ignore_case("Apple", "apple"), Ordering::Equal);
//! assert_eq!(compare_ignore_case("apple", "Banana"), Ordering::Less);
//! ```

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Derives the sort key of a record for a named field.
///
/// Implementations must be pure: the same record and field always yield
/// the same key. How a record is parsed or stored is entirely up to the
/// implementation.
pub trait KeyExtractor<R: ?Sized> {
    /// Returns the sort key of `record` for `field`.
    fn extract(&self, record: &R, field: &str) -> String;
}

impl<R: ?Sized, F> KeyExtractor<R> for F
where
    F: Fn(&R, &str) -> String,
{
    #[inline]
    fn extract(&self, record: &R, field: &str) -> String {
        self(record, field)
    }
}

/// Extractor for records stored as field-name to value maps.
///
/// An exact field-name match wins. Otherwise field names are matched
/// ignoring case, and among several case variants of the field the
/// smallest name in byte order is used, so the result never depends on
/// map iteration order. A record without the field yields the empty key,
/// which sorts before every other key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldLookup;

impl FieldLookup {
    fn lookup<'a, I>(entries: I, field: &str) -> String
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut folded: Option<(&String, &String)> = None;
        for (name, value) in entries {
            if name == field {
                return value.clone();
            }
            if compare_ignore_case(name, field) == Ordering::Equal
                && folded.is_none_or(|(best, _)| name < best)
            {
                folded = Some((name, value));
            }
        }
        folded.map(|(_, value)| value.clone()).unwrap_or_default()
    }
}

impl KeyExtractor<BTreeMap<String, String>> for FieldLookup {
    fn extract(&self, record: &BTreeMap<String, String>, field: &str) -> String {
        record
            .get(field)
            .cloned()
            .unwrap_or_else(|| Self::lookup(record, field))
    }
}

impl<S: BuildHasher> KeyExtractor<HashMap<String, String, S>> for FieldLookup {
    fn extract(&self, record: &HashMap<String, String, S>, field: &str) -> String {
        record
            .get(field)
            .cloned()
            .unwrap_or_else(|| Self::lookup(record, field))
    }
}

impl KeyExtractor<[(String, String)]> for FieldLookup {
    fn extract(&self, record: &[(String, String)], field: &str) -> String {
        Self::lookup(record.iter().map(|(name, value)| (name, value)), field)
    }
}

impl KeyExtractor<Vec<(String, String)>> for FieldLookup {
    fn extract(&self, record: &Vec<(String, String)>, field: &str) -> String {
        <Self as KeyExtractor<[(String, String)]>>::extract(self, record, field)
    }
}

/// Folds a character to a case-independent form.
///
/// Upper-cases first and then lower-cases, so characters whose case
/// mappings are not symmetric still compare equal to their counterparts.
/// A mapping that expands to several characters (`ß` to `SS`) leaves the
/// character unchanged.
#[inline]
fn fold_case(character: char) -> char {
    let upper = single(character.to_uppercase()).unwrap_or(character);
    single(upper.to_lowercase()).unwrap_or(upper)
}

#[inline]
fn single<I: ExactSizeIterator<Item = char>>(mut mapping: I) -> Option<char> {
    if mapping.len() == 1 {
        mapping.next()
    } else {
        None
    }
}

/// Compares two keys lexicographically, ignoring case.
///
/// Characters are compared one at a time after case folding; when one key
/// is a prefix of the other, the shorter key sorts first.
#[must_use]
pub fn compare_ignore_case(left: &str, right: &str) -> Ordering {
    left.chars().map(fold_case).cmp(right.chars().map(fold_case))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a", "b", Ordering::Less)]
    #[case("B", "a", Ordering::Greater)]
    #[case("abc", "ABC", Ordering::Equal)]
    #[case("ab", "abc", Ordering::Less)]
    #[case("", "a", Ordering::Less)]
    #[case("", "", Ordering::Equal)]
    #[case("Zeta", "alpha", Ordering::Greater)]
    #[case("ÉCOLE", "école", Ordering::Equal)]
    #[case("ß", "s", Ordering::Greater)]
    #[case("straße", "strase", Ordering::Greater)]
    #[case("ß", "ß", Ordering::Equal)]
    #[case("ﬀ", "f", Ordering::Greater)]
    #[case("ﬀ", "ff", Ordering::Greater)]
    fn test_compare_ignore_case(
        #[case] left: &str,
        #[case] right: &str,
        #[case] expected: Ordering,
    ) {
        assert_eq!(compare_ignore_case(left, right), expected);
        assert_eq!(compare_ignore_case(right, left), expected.reverse());
    }

    #[rstest]
    fn test_field_lookup_btree_map_matches_case_insensitively() {
        let record = BTreeMap::from([
            ("ID".to_string(), "42".to_string()),
            ("name".to_string(), "zed".to_string()),
        ]);
        assert_eq!(FieldLookup.extract(&record, "id"), "42");
        assert_eq!(FieldLookup.extract(&record, "name"), "zed");
    }

    #[rstest]
    fn test_field_lookup_missing_field_is_empty_key() {
        let record: HashMap<String, String> =
            HashMap::from([("name".to_string(), "zed".to_string())]);
        assert_eq!(FieldLookup.extract(&record, "id"), "");
    }

    #[rstest]
    fn test_field_lookup_pairs() {
        let record = vec![
            ("id".to_string(), "7".to_string()),
            ("Id".to_string(), "8".to_string()),
        ];
        assert_eq!(FieldLookup.extract(&record, "ID"), "8");
        assert_eq!(FieldLookup.extract(&record, "Id"), "8");
        assert_eq!(FieldLookup.extract(&record, "id"), "7");
    }

    #[rstest]
    fn test_field_lookup_case_variants_agree_across_record_shapes() {
        let entries = [
            ("id".to_string(), "lower".to_string()),
            ("Id".to_string(), "title".to_string()),
            ("ID".to_string(), "upper".to_string()),
        ];
        let pairs = entries.to_vec();
        let mut reversed = entries.to_vec();
        reversed.reverse();
        let tree: BTreeMap<String, String> = entries.iter().cloned().collect();
        let hashed: HashMap<String, String> = entries.iter().cloned().collect();

        for field in ["iD", "ID", "id"] {
            let expected = FieldLookup.extract(&tree, field);
            assert_eq!(FieldLookup.extract(&hashed, field), expected);
            assert_eq!(FieldLookup.extract(&pairs, field), expected);
            assert_eq!(FieldLookup.extract(&reversed, field), expected);
        }
        assert_eq!(FieldLookup.extract(&hashed, "iD"), "upper");
        assert_eq!(FieldLookup.extract(&hashed, "id"), "lower");
    }

    #[rstest]
    fn test_closure_extractor() {
        let extractor = |record: &(u32, String), field: &str| {
            if field == "number" {
                format!("{:05}", record.0)
            } else {
                record.1.clone()
            }
        };
        let record = (42, "x".to_string());
        assert_eq!(extractor.extract(&record, "number"), "00042");
        assert_eq!(extractor.extract(&record, "label"), "x");
    }
}
