use crate::error::{CharrefError, Result};
use std::collections::{BTreeMap, HashMap};

/// Immutable bidirectional mapping between HTML5 named character references
/// and the code points they denote.
///
/// Both directions are built together in [`ReferenceTable::from_entries`] and
/// never mutated afterwards. Several names may alias one code point, so the
/// reverse direction maps to every name in sorted name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceTable {
    forward: BTreeMap<String, char>,
    reverse: HashMap<char, Vec<String>>,
}

impl ReferenceTable {
    /// Builds a table from `(name, character)` pairs. Names must include the
    /// leading `&` and trailing `;`. A repeated name keeps its last value.
    pub fn from_entries<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, char)>,
        S: Into<String>,
    {
        let mut forward = BTreeMap::new();
        for (name, character) in entries {
            let name = name.into();
            if !is_reference_name(&name) {
                return Err(CharrefError::InvalidEntry {
                    value: character.to_string(),
                    name,
                });
            }
            forward.insert(name, character);
        }

        let mut reverse: HashMap<char, Vec<String>> = HashMap::new();
        for (name, character) in &forward {
            reverse.entry(*character).or_default().push(name.clone());
        }

        Ok(Self { forward, reverse })
    }

    pub fn lookup_name(&self, name: &str) -> Option<char> {
        self.forward.get(name).copied()
    }

    /// All names registered for `character`, or `None` if it has none.
    pub fn lookup_code_point(&self, character: char) -> Option<&[String]> {
        self.reverse.get(&character).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Entries in sorted name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, char)> {
        self.forward
            .iter()
            .map(|(name, character)| (name.as_str(), *character))
    }

    pub fn to_entries(&self) -> BTreeMap<String, char> {
        self.forward.clone()
    }
}

fn is_reference_name(name: &str) -> bool {
    name.len() > 2
        && name.starts_with('&')
        && name.ends_with(';')
        && name[1..name.len() - 1]
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || byte == b'_')
}

#[cfg(test)]
pub(crate) fn sample_table() -> ReferenceTable {
    ReferenceTable::from_entries([
        ("&copy;", '\u{00A9}'),
        ("&COPY;", '\u{00A9}'),
        ("&lt;", '<'),
        ("&LT;", '<'),
        ("&amp;", '&'),
        ("&AMP;", '&'),
        ("&lsqb;", '['),
        ("&lbrack;", '['),
        ("&HilbertSpace;", '\u{210B}'),
        ("&hamilt;", '\u{210B}'),
        ("&Hscr;", '\u{210B}'),
        ("&Afr;", '\u{1D504}'),
        ("&NewLine;", '\n'),
    ])
    .unwrap()
}

#[cfg(test)]
pub(crate) fn bundled_table() -> ReferenceTable {
    use crate::source::{BundledSource, ReferenceSource};
    ReferenceTable::from_entries(BundledSource.fetch().unwrap()).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_name() {
        let table = sample_table();
        assert_eq!(table.lookup_name("&copy;"), Some('\u{00A9}'));
        assert_eq!(table.lookup_name("&Afr;"), Some('\u{1D504}'));
        assert_eq!(table.lookup_name("&notarealentity;"), None);
        assert_eq!(table.lookup_name("copy"), None);
    }

    #[test]
    fn test_reverse_lookup_sorted_names() {
        let table = sample_table();
        assert_eq!(
            table.lookup_code_point('\u{00A9}').unwrap(),
            ["&COPY;", "&copy;"]
        );
        assert_eq!(
            table.lookup_code_point('[').unwrap(),
            ["&lbrack;", "&lsqb;"]
        );
        assert_eq!(
            table.lookup_code_point('\u{210B}').unwrap(),
            ["&HilbertSpace;", "&Hscr;", "&hamilt;"]
        );
    }

    #[test]
    fn test_reverse_lookup_missing() {
        let table = sample_table();
        assert!(table.lookup_code_point('a').is_none());
    }

    #[test]
    fn test_repeated_name_keeps_last_value() {
        let table = ReferenceTable::from_entries([("&x;", 'a'), ("&x;", 'b')]).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup_name("&x;"), Some('b'));
        assert!(table.lookup_code_point('a').is_none());
        assert_eq!(table.lookup_code_point('b').unwrap(), ["&x;"]);
    }

    #[test]
    fn test_rejects_malformed_names() {
        for name in ["copy;", "&copy", "&;", "&co py;", "&co&py;"] {
            let result = ReferenceTable::from_entries([(name, '\u{00A9}')]);
            assert!(
                matches!(result, Err(CharrefError::InvalidEntry { .. })),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_iter_in_name_order() {
        let table = sample_table();
        let names: Vec<&str> = table.iter().map(|(name, _)| name).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        assert_eq!(names.len(), table.len());
    }

    #[test]
    fn test_bundled_reverse_lists() {
        let table = bundled_table();
        assert_eq!(table.lookup_code_point('<').unwrap(), ["&LT;", "&lt;"]);
        assert_eq!(
            table.lookup_code_point('[').unwrap(),
            ["&lbrack;", "&lsqb;"]
        );
        for (_, character) in table.iter() {
            let names = table.lookup_code_point(character).unwrap();
            let mut deduped = names.to_vec();
            deduped.dedup();
            assert_eq!(deduped.len(), names.len());
            assert!(names.iter().all(|name| table.lookup_name(name) == Some(character)));
        }
    }

    #[test]
    fn test_to_entries_rebuilds_same_table() {
        let table = sample_table();
        let rebuilt = ReferenceTable::from_entries(table.to_entries()).unwrap();
        assert_eq!(rebuilt, table);
    }

    #[test]
    fn test_empty_table() {
        let table = ReferenceTable::default();
        assert!(table.is_empty());
        assert_eq!(table.lookup_name("&amp;"), None);
    }
}
