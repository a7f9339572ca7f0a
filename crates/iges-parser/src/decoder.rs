// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lazy parameter decoder with caching

use crate::records::Record;
use crate::tokenizer::{parse_parameters, Delimiters};
use iges_model::{
    DeNumber, DirectoryEntry, ParameterRecord, ParameterSource, ParseError, Result,
};
use rustc_hash::FxHashMap;
use std::sync::{Arc, RwLock};

/// One Parameter section record
#[derive(Clone, Debug)]
struct ParameterLine {
    /// Columns 1-64, padded to full width
    data: String,
    /// Owning DE from columns 66-72
    owner: u32,
}

/// Lazy parameter decoder with caching
///
/// Tokenizes an entity's parameter data on first request and caches the
/// result by directory index.
pub struct ParameterDecoder {
    lines: Vec<ParameterLine>,
    delimiters: Delimiters,
    cache: RwLock<FxHashMap<usize, Arc<ParameterRecord>>>,
}

impl ParameterDecoder {
    /// Create a decoder over the `P` records
    pub fn new(records: &[Record<'_>], delimiters: Delimiters) -> Self {
        let lines = records
            .iter()
            .map(|r| ParameterLine {
                data: format!("{:<64}", r.parameter_data()),
                owner: r.parameter_owner(),
            })
            .collect();
        Self {
            lines,
            delimiters,
            cache: RwLock::new(FxHashMap::default()),
        }
    }

    /// Number of Parameter section records
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Delimiters in use
    pub fn delimiters(&self) -> Delimiters {
        self.delimiters
    }

    /// Get cache size
    pub fn cache_size(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    /// Concatenated parameter text of one entity
    fn gather(&self, de: DeNumber, entry: &DirectoryEntry) -> Result<String> {
        let first = entry.param as usize;
        if first == 0 || first > self.lines.len() {
            return Err(ParseError::InvalidParameterPointer {
                de,
                pointer: entry.param,
            });
        }

        let start = first - 1;
        let end = if entry.param_lines > 0 {
            (start + entry.param_lines as usize).min(self.lines.len())
        } else {
            // no count given: follow the owner back-pointers
            let owner = self.lines[start].owner;
            start
                + 1
                + self.lines[start + 1..]
                    .iter()
                    .take_while(|l| l.owner == owner)
                    .count()
        };

        Ok(self.lines[start..end]
            .iter()
            .map(|l| l.data.as_str())
            .collect())
    }

    fn decode_uncached(&self, de: DeNumber, entry: &DirectoryEntry) -> Result<ParameterRecord> {
        let text = self.gather(de, entry)?;
        let params = parse_parameters(&text, self.delimiters)
            .map_err(|e| ParseError::entity_parse(de, e))?;
        let record = ParameterRecord::new(de, params);

        let expected = entry.type_number();
        match record.type_tag() {
            Some(found) if found == expected as i64 => Ok(record),
            found => Err(ParseError::TypeMismatch {
                de,
                expected,
                found: found.unwrap_or(0),
            }),
        }
    }

    /// Clear the cache
    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }
}

impl ParameterSource for ParameterDecoder {
    fn parameters(&self, de: DeNumber, entry: &DirectoryEntry) -> Result<Arc<ParameterRecord>> {
        let key = de.index();
        if let Ok(cache) = self.cache.read() {
            if let Some(cached) = cache.get(&key) {
                return Ok(Arc::clone(cached));
            }
        }

        let arc = Arc::new(self.decode_uncached(de, entry)?);
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(key, Arc::clone(&arc));
        }
        Ok(arc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::split_sections;
    use iges_model::{EntityType, Parameter};

    fn p_line(data: &str, de: u32, seq: usize) -> String {
        format!("{:<64}{:>8}P{:07}\n", data, de, seq)
    }

    fn decoder(content: &str) -> ParameterDecoder {
        let sections = split_sections(content).unwrap();
        ParameterDecoder::new(&sections.parameter, Delimiters::default())
    }

    fn entry(entity_type: EntityType, param: u32, param_lines: u32) -> DirectoryEntry {
        DirectoryEntry {
            entity_type,
            param,
            param_lines,
            ..Default::default()
        }
    }

    #[test]
    fn test_decode_multi_line() {
        let content = p_line("110,0.,0.,0.,", 1, 1) + &p_line("1.,2.,3.;", 1, 2);
        let decoder = decoder(&content);
        let rec = decoder
            .parameters(DeNumber(1), &entry(EntityType::Line, 1, 2))
            .unwrap();
        assert_eq!(rec.len(), 7);
        assert_eq!(rec.get(6), Some(&Parameter::Real(3.0)));
    }

    #[test]
    fn test_hollerith_across_lines() {
        let name = "x".repeat(70);
        let full = format!("406,1,70H{};", name);
        let (a, b) = full.split_at(64);
        let content = p_line(a, 1, 1) + &p_line(b, 1, 2);
        let decoder = decoder(&content);
        let rec = decoder
            .parameters(DeNumber(1), &entry(EntityType::Property, 1, 2))
            .unwrap();
        assert_eq!(rec.get_string(2), Some(name.as_str()));
    }

    #[test]
    fn test_line_count_from_back_pointers() {
        let content = p_line("110,0.,0.,0.,", 1, 1)
            + &p_line("1.,2.,3.;", 1, 2)
            + &p_line("158,1.;", 3, 3);
        let decoder = decoder(&content);
        let rec = decoder
            .parameters(DeNumber(1), &entry(EntityType::Line, 1, 0))
            .unwrap();
        assert_eq!(rec.len(), 7);
    }

    #[test]
    fn test_caching() {
        let content = p_line("158,1.;", 1, 1);
        let decoder = decoder(&content);
        let e = entry(EntityType::Sphere, 1, 1);
        let first = decoder.parameters(DeNumber(1), &e).unwrap();
        let second = decoder.parameters(DeNumber(1), &e).unwrap();
        assert_eq!(decoder.cache_size(), 1);
        assert!(Arc::ptr_eq(&first, &second));

        decoder.clear_cache();
        assert_eq!(decoder.cache_size(), 0);
        let third = decoder.parameters(DeNumber(1), &e).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(first, third);
    }

    #[test]
    fn test_pointer_out_of_range() {
        let decoder = decoder(&p_line("158,1.;", 1, 1));
        for bad in [0, 2] {
            let err = decoder
                .parameters(DeNumber(1), &entry(EntityType::Sphere, bad, 1))
                .unwrap_err();
            assert!(matches!(err, ParseError::InvalidParameterPointer { .. }));
        }
    }

    #[test]
    fn test_type_mismatch() {
        let decoder = decoder(&p_line("158,1.;", 1, 1));
        let err = decoder
            .parameters(DeNumber(1), &entry(EntityType::Torus, 1, 1))
            .unwrap_err();
        match err {
            ParseError::TypeMismatch {
                expected, found, ..
            } => {
                assert_eq!(expected, 160);
                assert_eq!(found, 158);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(!ParseError::TypeMismatch {
            de: DeNumber(1),
            expected: 1,
            found: 2
        }
        .is_structural());
    }
}
