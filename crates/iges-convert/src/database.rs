// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory geometry database
//!
//! Keeps objects in write order and serializes to JSON.

use iges_model::{Combination, DbError, GeometryWriter, Solid};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// One named database object
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DbObject {
    Solid { name: String, solid: Solid },
    Combination { name: String, comb: Combination },
}

impl DbObject {
    pub fn name(&self) -> &str {
        match self {
            DbObject::Solid { name, .. } | DbObject::Combination { name, .. } => name,
        }
    }
}

/// Database that keeps every object in memory
#[derive(Clone, Debug, Default, Serialize)]
pub struct MemoryDatabase {
    pub title: String,
    pub units: String,
    objects: Vec<DbObject>,
    #[serde(skip)]
    index: FxHashMap<String, usize>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Object by name
    pub fn get(&self, name: &str) -> Option<&DbObject> {
        self.index.get(name).and_then(|&i| self.objects.get(i))
    }

    /// Solid by name
    pub fn solid(&self, name: &str) -> Option<&Solid> {
        match self.get(name)? {
            DbObject::Solid { solid, .. } => Some(solid),
            DbObject::Combination { .. } => None,
        }
    }

    /// Combination by name
    pub fn combination(&self, name: &str) -> Option<&Combination> {
        match self.get(name)? {
            DbObject::Combination { comb, .. } => Some(comb),
            DbObject::Solid { .. } => None,
        }
    }

    /// Objects in write order
    pub fn objects(&self) -> &[DbObject] {
        &self.objects
    }

    /// Object names in write order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.objects.iter().map(DbObject::name)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Pretty-printed JSON of the header and all objects
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    fn insert(&mut self, object: DbObject) -> Result<(), DbError> {
        let name = object.name().to_string();
        if self.index.contains_key(&name) {
            return Err(DbError::Duplicate(name));
        }
        self.index.insert(name, self.objects.len());
        self.objects.push(object);
        Ok(())
    }
}

impl GeometryWriter for MemoryDatabase {
    fn write_header(&mut self, title: &str, units: &str) -> Result<(), DbError> {
        self.title = title.to_string();
        self.units = units.to_string();
        Ok(())
    }

    fn write_solid(&mut self, name: &str, solid: Solid) -> Result<(), DbError> {
        self.insert(DbObject::Solid {
            name: name.to_string(),
            solid,
        })
    }

    fn write_combination(&mut self, name: &str, comb: Combination) -> Result<(), DbError> {
        self.insert(DbObject::Combination {
            name: name.to_string(),
            comb,
        })
    }

    fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iges_model::{BoolOp, Member};

    #[test]
    fn test_write_and_lookup() {
        let mut db = MemoryDatabase::new();
        db.write_header("part", "mm").unwrap();
        db.write_solid(
            "sph.1",
            Solid::Sphere {
                center: [0.0; 3],
                radius: 2.0,
            },
        )
        .unwrap();
        db.write_combination(
            "all",
            Combination::group(vec![Member::new("sph.1", BoolOp::Union)]),
        )
        .unwrap();

        assert_eq!(db.len(), 2);
        assert!(db.contains("sph.1"));
        assert!(db.solid("sph.1").is_some());
        assert!(db.solid("all").is_none());
        assert_eq!(db.combination("all").unwrap().members.len(), 1);
        assert_eq!(db.names().collect::<Vec<_>>(), ["sph.1", "all"]);
    }

    #[test]
    fn test_duplicate_name() {
        let mut db = MemoryDatabase::new();
        db.write_combination("a", Combination::default()).unwrap();
        assert_eq!(
            db.write_combination("a", Combination::default()),
            Err(DbError::Duplicate("a".to_string()))
        );
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn test_json_output() {
        let mut db = MemoryDatabase::new();
        db.write_header("part", "mm").unwrap();
        db.write_solid(
            "sph.1",
            Solid::Sphere {
                center: [1.0, 2.0, 3.0],
                radius: 2.0,
            },
        )
        .unwrap();
        let json: serde_json::Value = serde_json::from_str(&db.to_json().unwrap()).unwrap();
        assert_eq!(json["title"], "part");
        assert_eq!(json["objects"][0]["kind"], "solid");
        assert_eq!(json["objects"][0]["name"], "sph.1");
    }
}
