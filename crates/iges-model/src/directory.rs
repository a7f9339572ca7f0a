// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Directory section entries
//!
//! One [`DirectoryEntry`] per entity, stored in file order. The table is
//! loaded once and then annotated by the conversion passes (names, colors,
//! reference counts, instance aliases).

use crate::{DeNumber, EntityType, Transform};

/// One entity's directory entry plus conversion annotations
#[derive(Clone, Debug, Default)]
pub struct DirectoryEntry {
    /// Entity type (field 1)
    pub entity_type: EntityType,
    /// Form number (field 15)
    pub form: i32,
    /// P-section sequence number of the first parameter record (field 2)
    pub param: u32,
    /// Number of parameter records (field 14)
    pub param_lines: u32,
    /// Structure (field 3); `-DE` of the definition for attribute instances
    pub structure: i32,
    /// Line font pattern (field 4)
    pub line_font: i32,
    /// Level (field 5)
    pub level: i32,
    /// View (field 6)
    pub view: i32,
    /// Label display associativity (field 8)
    pub label_assoc: i32,
    /// Status number, eight digits (field 9)
    pub status: String,
    /// DE of the transformation matrix, 0 for none (field 7)
    pub trans: i32,
    /// Evaluated transformation matrix
    pub rot: Transform,
    /// Color (field 13): palette index, or `-DE` of a color definition
    pub colorp: i32,
    /// Resolved color
    pub rgb: Option<[u8; 3]>,
    /// Entity label (field 18)
    pub label: String,
    /// Entity subscript (field 19)
    pub subscript: i32,
    /// Unique object name
    pub name: Option<String>,
    /// Number of times other entities use this one
    pub referenced: u32,
    /// Table index of the entity this instance collapsed onto
    pub alias_of: Option<usize>,
}

impl DirectoryEntry {
    /// Raw type number
    pub fn type_number(&self) -> u16 {
        self.entity_type.number()
    }

    /// Name or a placeholder for logging
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }

    /// DE of the attribute definition this entry instantiates, if any
    pub fn structure_pointer(&self) -> Option<DeNumber> {
        if self.structure < 0 {
            DeNumber::from_pointer(-(self.structure as i64))
        } else {
            None
        }
    }
}

/// All directory entries, indexed by `(DE - 1) / 2`
#[derive(Clone, Debug, Default)]
pub struct DirectoryTable {
    entries: Vec<DirectoryEntry>,
}

impl DirectoryTable {
    /// Create a table from loaded entries
    pub fn new(entries: Vec<DirectoryEntry>) -> Self {
        Self { entries }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Table index for a DE number, `None` when out of range
    pub fn lookup(&self, de: DeNumber) -> Option<usize> {
        let index = de.index();
        (de.0 % 2 == 1 && index < self.entries.len()).then_some(index)
    }

    /// Entry by DE number
    pub fn get(&self, de: DeNumber) -> Option<&DirectoryEntry> {
        self.lookup(de).map(|i| &self.entries[i])
    }

    /// Entry by table index
    pub fn entry(&self, index: usize) -> Option<&DirectoryEntry> {
        self.entries.get(index)
    }

    /// Mutable entry by table index
    pub fn entry_mut(&mut self, index: usize) -> Option<&mut DirectoryEntry> {
        self.entries.get_mut(index)
    }

    /// Iterate entries with their table index
    pub fn iter(&self) -> impl Iterator<Item = (usize, &DirectoryEntry)> {
        self.entries.iter().enumerate()
    }

    /// Mutable iteration
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut DirectoryEntry> {
        self.entries.iter_mut()
    }

    /// Table indices of all entries of one type, in file order
    pub fn indices_of(&self, entity_type: EntityType) -> Vec<usize> {
        self.iter()
            .filter(|(_, e)| e.entity_type == entity_type)
            .map(|(i, _)| i)
            .collect()
    }

    /// Increment the reference count of an entry
    pub fn add_reference(&mut self, index: usize) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.referenced += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DirectoryTable {
        DirectoryTable::new(vec![
            DirectoryEntry {
                entity_type: EntityType::Sphere,
                ..Default::default()
            },
            DirectoryEntry {
                entity_type: EntityType::SolidInstance,
                structure: -1,
                ..Default::default()
            },
            DirectoryEntry {
                entity_type: EntityType::Sphere,
                ..Default::default()
            },
        ])
    }

    #[test]
    fn test_lookup_bounds() {
        let t = table();
        assert_eq!(t.lookup(DeNumber(1)), Some(0));
        assert_eq!(t.lookup(DeNumber(5)), Some(2));
        assert_eq!(t.lookup(DeNumber(7)), None);
        assert_eq!(t.lookup(DeNumber(4)), None);
    }

    #[test]
    fn test_indices_of_type() {
        assert_eq!(table().indices_of(EntityType::Sphere), vec![0, 2]);
    }

    #[test]
    fn test_structure_pointer() {
        let t = table();
        assert_eq!(t.entry(1).unwrap().structure_pointer(), Some(DeNumber(1)));
        assert_eq!(t.entry(0).unwrap().structure_pointer(), None);
    }

    #[test]
    fn test_add_reference() {
        let mut t = table();
        t.add_reference(2);
        t.add_reference(2);
        t.add_reference(99);
        assert_eq!(t.entry(2).unwrap().referenced, 2);
    }
}
