/*
 * Copyright © 2024 ladroid
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use rustc_hash::FxHashMap;
use crate::triple::Triple;

// Dictionary for encoding and decoding terms.
// IRIs and blank nodes are stored bare, literals in N-Triples form:
// "lexical", "lexical"^^<datatype> or "lexical"@lang.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Dictionary {
    string_to_id: FxHashMap<String, u32>,
    id_to_string: FxHashMap<u32, String>,
    next_id: u32,
}

impl Dictionary {
    pub fn new() -> Self {
        Dictionary {
            string_to_id: FxHashMap::default(),
            id_to_string: FxHashMap::default(),
            next_id: 0,
        }
    }

    pub fn encode(&mut self, value: &str) -> u32 {
        if let Some(&id) = self.string_to_id.get(value) {
            id
        } else {
            let id = self.next_id;
            self.string_to_id.insert(value.to_string(), id);
            self.id_to_string.insert(id, value.to_string());
            self.next_id += 1;
            id
        }
    }

    /// Encodes a typed literal as `"lexical"^^<datatype>`.
    pub fn encode_typed_literal(&mut self, lexical: &str, datatype: &str) -> u32 {
        self.encode(&format!("\"{}\"^^<{}>", lexical, datatype))
    }

    /// Lookup without allocating a new id.
    pub fn get_id(&self, value: &str) -> Option<u32> {
        self.string_to_id.get(value).copied()
    }

    pub fn decode(&self, id: u32) -> Option<&str> {
        self.id_to_string.get(&id).map(|s| s.as_str())
    }

    pub fn decode_triple(&self, triple: &Triple) -> String {
        let s = self.decode(triple.subject).unwrap_or("unknown");
        let p = self.decode(triple.predicate).unwrap_or("unknown");
        let o = self.decode(triple.object).unwrap_or("unknown");
        format!("{} {} {} .", s, p, o)
    }

    pub fn is_literal(&self, id: u32) -> bool {
        self.decode(id).map_or(false, |s| s.starts_with('"'))
    }

    /// Lexical form and datatype of a literal id, `None` for IRIs and unknown ids.
    pub fn literal(&self, id: u32) -> Option<(&str, Option<&str>)> {
        self.decode(id).and_then(split_literal)
    }

    pub fn len(&self) -> usize {
        self.id_to_string.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_string.is_empty()
    }
}

/// Splits `"lex"^^<dt>`, `"lex"@lang` or `"lex"` into lexical form and datatype.
pub fn split_literal(value: &str) -> Option<(&str, Option<&str>)> {
    let rest = value.strip_prefix('"')?;
    let close = rest.rfind('"')?;
    let lexical = &rest[..close];
    let suffix = &rest[close + 1..];
    if let Some(dt) = suffix.strip_prefix("^^") {
        let dt = dt.trim_start_matches('<').trim_end_matches('>');
        Some((lexical, Some(dt)))
    } else {
        Some((lexical, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_id_does_not_allocate() {
        let mut dict = Dictionary::new();
        let id = dict.encode("http://example.org/a");
        assert_eq!(dict.get_id("http://example.org/a"), Some(id));
        assert_eq!(dict.get_id("http://example.org/b"), None);
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn test_split_literal() {
        assert_eq!(
            split_literal("\"42\"^^<http://www.w3.org/2001/XMLSchema#integer>"),
            Some(("42", Some("http://www.w3.org/2001/XMLSchema#integer")))
        );
        assert_eq!(split_literal("\"chat\"@fr"), Some(("chat", None)));
        assert_eq!(split_literal("http://example.org/a"), None);
    }

    #[test]
    fn test_typed_literal_round_trip() {
        let mut dict = Dictionary::new();
        let id = dict.encode_typed_literal("3.5", "http://www.w3.org/2001/XMLSchema#double");
        assert!(dict.is_literal(id));
        assert_eq!(dict.literal(id), Some(("3.5", Some("http://www.w3.org/2001/XMLSchema#double"))));
    }
}
