// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::collections::identifiable::{FxIndexSet, Id, StringId};

/// Holds unique strings and provides [StringId]s that correspond to the order
/// that the strings were inserted.
pub struct StringTable {
    /// The ordered hash set of unique strings. The order becomes the StringId.
    strings: FxIndexSet<Box<str>>,
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}

impl StringTable {
    /// Creates a new string table, which initially holds the empty string and
    /// no others.
    pub fn new() -> Self {
        let mut strings = FxIndexSet::default();
        // A profile holds at least "", two sample types with their units, and
        // one name and one file per distinct frame, so skip the tiny sizes.
        strings.reserve(32);

        // pprof requires the empty string to be item 0.
        strings.insert(Box::from(""));

        Self { strings }
    }

    /// Returns the number of strings currently held in the string table.
    #[inline]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Adds the string to the string table if it isn't present already, and
    /// returns a [StringId] that corresponds to the order that this string
    /// was originally inserted.
    pub fn intern(&mut self, s: &str) -> StringId {
        match self.strings.get_index_of(s) {
            Some(offset) => StringId::from_offset(offset),
            None => {
                let (offset, _) = self.strings.insert_full(Box::from(s));
                StringId::from_offset(offset)
            }
        }
    }

    /// Drops every string interned after the first `len`. The empty string
    /// is always kept.
    pub fn truncate(&mut self, len: usize) {
        self.strings.truncate(len.max(1));
    }

    /// Returns the string stored under `id`, if any.
    pub fn get(&self, id: StringId) -> Option<&str> {
        let offset = usize::try_from(id.to_raw_id()).ok()?;
        self.strings.get_index(offset).map(|s| &**s)
    }

    /// Consumes the table, producing the strings in id order, which is the
    /// shape of pprof's `string_table`.
    pub fn into_pprof_strings(self) -> Vec<String> {
        self.strings.into_iter().map(String::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owned_string_table() {
        let mut table = StringTable::new();
        // The empty string should already be present.
        assert_eq!(1, table.len());
        assert_eq!(StringId::ZERO, table.intern(""));

        let cases = [
            ("samples", 1),
            ("count", 2),
            ("cpu", 3),
            ("nanoseconds", 4),
            ("samples", 1),
            ("java.lang.Thread.run()", 5),
            ("Thread.java", 6),
        ];

        for (string, offset) in cases {
            let id = table.intern(string);
            assert_eq!(offset, id.to_raw_id());
            assert_eq!(Some(string), table.get(id));
        }

        assert_eq!(7, table.len());
        table.truncate(0);
        assert_eq!(1, table.len());
        assert_eq!(Some(""), table.get(StringId::ZERO));
        assert_eq!(StringId::from_offset(1), table.intern("Thread.java"));

        let strings = table.into_pprof_strings();
        assert_eq!(vec!["", "Thread.java"], strings);
    }
}
